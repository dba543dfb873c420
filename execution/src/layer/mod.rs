//! Session orchestrator.
//!
//! [Layer] turns transport-independent [Intent]s into store mutations and
//! outbound [Notification]s. It owns the stores it is given and is driven by
//! a single task, so every mutation happens in intent order.

use duelbot_types::{
    Action, ChatId, GameKind, MessageId, SessionKey, Standing, User, UserId,
};
use tracing::debug;

use crate::{
    games::{GameError, GameRng},
    IdentityDirectory, Leaderboard, SessionRegistry,
};

mod handlers;
pub mod messages;

/// Someone named in a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// Identity known from the event itself (reply author, linked mention).
    User(User),
    /// Bare `@handle` that must be resolved through the directory.
    Handle(String),
}

/// Parsed request to the orchestrator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    /// Invite one user. `anchor` is the triggering message and becomes the
    /// session key once accepted.
    Challenge {
        kind: GameKind,
        chat: ChatId,
        anchor: MessageId,
        initiator: User,
        target: Target,
    },
    /// Start roulette right away among the named users.
    StartRoulette {
        chat: ChatId,
        anchor: MessageId,
        initiator: User,
        participants: Vec<Target>,
    },
    Accept {
        kind: GameKind,
        chat: ChatId,
        actor: User,
        initiator: UserId,
        session: MessageId,
    },
    Reject {
        kind: GameKind,
        chat: ChatId,
        actor: User,
        initiator: UserId,
    },
    /// Shoot (duel) or pull the trigger (roulette).
    Act {
        kind: GameKind,
        chat: ChatId,
        actor: User,
        session: MessageId,
    },
    Stats {
        chat: ChatId,
    },
}

impl Intent {
    /// Intent for a pressed action button.
    pub fn from_action(chat: ChatId, actor: User, action: Action) -> Self {
        match action {
            Action::Accept {
                kind,
                initiator,
                session,
            } => Intent::Accept {
                kind,
                chat,
                actor,
                initiator,
                session,
            },
            Action::Reject { kind, initiator } => Intent::Reject {
                kind,
                chat,
                actor,
                initiator,
            },
            Action::Act { kind, session } => Intent::Act {
                kind,
                chat,
                actor,
                session,
            },
        }
    }
}

/// Labeled button carrying an [Action].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: Action,
}

impl Button {
    pub fn new(label: &str, action: Action) -> Self {
        Self {
            label: label.to_string(),
            action,
        }
    }
}

/// Outbound effect to be delivered by the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    Text {
        chat: ChatId,
        text: String,
    },
    Prompt {
        chat: ChatId,
        text: String,
        buttons: Vec<Button>,
    },
}

impl Notification {
    pub fn text(chat: ChatId, text: impl Into<String>) -> Self {
        Notification::Text {
            chat,
            text: text.into(),
        }
    }

    pub fn prompt(chat: ChatId, text: impl Into<String>, buttons: Vec<Button>) -> Self {
        Notification::Prompt {
            chat,
            text: text.into(),
            buttons,
        }
    }

    pub fn chat(&self) -> ChatId {
        match self {
            Notification::Text { chat, .. } | Notification::Prompt { chat, .. } => *chat,
        }
    }

    pub fn body(&self) -> &str {
        match self {
            Notification::Text { text, .. } | Notification::Prompt { text, .. } => text,
        }
    }
}

pub struct Layer {
    bot: UserId,
    directory: IdentityDirectory,
    leaderboard: Leaderboard,
    registry: SessionRegistry,
    rng: GameRng,
}

impl Layer {
    pub fn new(
        bot: UserId,
        directory: IdentityDirectory,
        leaderboard: Leaderboard,
        registry: SessionRegistry,
        rng: GameRng,
    ) -> Self {
        Self {
            bot,
            directory,
            leaderboard,
            registry,
            rng,
        }
    }

    /// Record the handle of a user seen on an inbound event.
    pub fn observe(&mut self, user: &User) {
        self.directory.observe_user(user);
    }

    pub fn directory(&self) -> &IdentityDirectory {
        &self.directory
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn standings(&self) -> Vec<Standing> {
        self.leaderboard.snapshot()
    }

    pub fn execute(&mut self, intent: Intent) -> Vec<Notification> {
        debug!(?intent, "executing intent");
        match intent {
            Intent::Challenge {
                kind,
                chat,
                anchor,
                initiator,
                target,
            } => self.handle_challenge(kind, chat, anchor, &initiator, target),
            Intent::StartRoulette {
                chat,
                anchor,
                initiator,
                participants,
            } => self.handle_start_roulette(chat, anchor, &initiator, participants),
            Intent::Accept {
                kind,
                chat,
                actor,
                initiator,
                session,
            } => self.handle_accept(kind, chat, &actor, initiator, session),
            Intent::Reject {
                kind,
                chat,
                actor,
                initiator,
            } => self.handle_reject(kind, chat, &actor, initiator),
            Intent::Act {
                kind,
                chat,
                actor,
                session,
            } => {
                let key = SessionKey::new(chat, session);
                match kind {
                    GameKind::Duel => self.handle_shoot(key, &actor),
                    GameKind::Roulette => self.handle_pull(key, &actor),
                }
            }
            Intent::Stats { chat } => self.handle_stats(chat),
        }
    }

    fn handle(&self, user: UserId) -> String {
        self.directory.reverse(user)
    }

    /// Text shown for a refused request.
    fn describe(&self, kind: GameKind, actor: &User, error: GameError) -> String {
        match error {
            GameError::SelfChallenge => messages::self_challenge(kind),
            GameError::BotChallenge => messages::bot_challenge(kind),
            GameError::NotYourTurn { .. } => messages::not_your_turn(&actor.handle),
            GameError::NotChallenged { .. } => messages::not_challenged(&actor.handle),
            GameError::NoPendingChallenge => messages::CHALLENGE_EXPIRED.to_string(),
            GameError::SessionNotFound | GameError::GameAlreadyComplete => {
                messages::SESSION_FINISHED.to_string()
            }
            GameError::NotEnoughPlayers { .. } => messages::NOT_ENOUGH_PLAYERS.to_string(),
            GameError::DuplicateParticipant => messages::DUPLICATE_PARTICIPANT.to_string(),
        }
    }

    fn refuse(
        &self,
        chat: ChatId,
        kind: GameKind,
        actor: &User,
        error: GameError,
    ) -> Vec<Notification> {
        debug!(%chat, user = %actor.id, %kind, %error, "request refused");
        vec![Notification::text(chat, self.describe(kind, actor, error))]
    }
}
