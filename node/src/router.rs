//! Classification of inbound events.
//!
//! Rules apply in order, first match wins:
//!
//! 1. `/stats` (or `/stats@<bot>`) shows the leaderboard.
//! 2. A game keyword in a reply challenges the author of the replied-to
//!    message.
//! 3. A game keyword with mentions challenges the first mentioned user. A
//!    roulette keyword naming two or more distinct users starts a game
//!    among them directly.
//! 4. A reply to the bot or a mention of the bot is a question for the
//!    assistant.
//!
//! Everything else, including other commands, is ignored.

use crate::assistant::Query;
use duelbot_execution::{Intent, Target};
use duelbot_types::{
    game::STATS_COMMAND, Action, AnnotationKind, CallbackQuery, GameKind, Inbound,
    InboundMessage, User,
};
use tracing::{debug, warn};

/// Where an inbound event should go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Game(Intent),
    Assistant(Query),
    Ignore,
}

#[derive(Clone, Debug)]
pub struct Router {
    bot: User,
    duel_keyword: String,
    roulette_keyword: String,
}

impl Router {
    /// Keywords are matched case-insensitively.
    pub fn new(bot: User, duel_keyword: &str, roulette_keyword: &str) -> Self {
        Self {
            bot,
            duel_keyword: duel_keyword.to_lowercase(),
            roulette_keyword: roulette_keyword.to_lowercase(),
        }
    }

    pub fn bot(&self) -> &User {
        &self.bot
    }

    pub fn route(&self, inbound: &Inbound) -> Route {
        match inbound {
            Inbound::Message(message) => self.route_message(message),
            Inbound::Callback(callback) => self.route_callback(callback),
        }
    }

    fn route_callback(&self, callback: &CallbackQuery) -> Route {
        match callback.data.parse::<Action>() {
            Ok(action) => Route::Game(Intent::from_action(
                callback.chat,
                callback.sender.clone(),
                action,
            )),
            Err(err) => {
                warn!(data = %callback.data, ?err, "ignoring unparseable action");
                Route::Ignore
            }
        }
    }

    fn route_message(&self, message: &InboundMessage) -> Route {
        if let Some((name, target)) = message.command() {
            let addressed = target.map_or(true, |target| self.is_bot_handle(target));
            if name == STATS_COMMAND && addressed {
                return Route::Game(Intent::Stats { chat: message.chat });
            }
            debug!(command = name, "ignoring command");
            return Route::Ignore;
        }

        if let Some(kind) = self.keyword(&message.text) {
            if let Some(intent) = self.challenge(kind, message) {
                return Route::Game(intent);
            }
        }

        match self.query(message) {
            Some(text) => Route::Assistant(Query {
                chat: message.chat,
                user: message.sender.clone(),
                text,
            }),
            None => Route::Ignore,
        }
    }

    /// Game named by `text`, if any. Duel wins when both keywords appear.
    fn keyword(&self, text: &str) -> Option<GameKind> {
        let text = text.to_lowercase();
        if text.contains(&self.duel_keyword) {
            Some(GameKind::Duel)
        } else if text.contains(&self.roulette_keyword) {
            Some(GameKind::Roulette)
        } else {
            None
        }
    }

    fn challenge(&self, kind: GameKind, message: &InboundMessage) -> Option<Intent> {
        let initiator = message.sender.clone();
        if let Some(author) = &message.reply_to {
            return Some(Intent::Challenge {
                kind,
                chat: message.chat,
                anchor: message.id,
                initiator,
                target: Target::User(author.clone()),
            });
        }

        let mut targets = self.targets(message);
        match (kind, targets.len()) {
            (_, 0) => None,
            (GameKind::Roulette, n) if n >= 2 => Some(Intent::StartRoulette {
                chat: message.chat,
                anchor: message.id,
                initiator,
                participants: targets,
            }),
            _ => Some(Intent::Challenge {
                kind,
                chat: message.chat,
                anchor: message.id,
                initiator,
                target: targets.swap_remove(0),
            }),
        }
    }

    /// Distinct mentioned users in order of appearance. A lone mention of the
    /// bot is kept so the challenge can be refused.
    fn targets(&self, message: &InboundMessage) -> Vec<Target> {
        let mut targets: Vec<Target> = Vec::new();
        for annotation in message.mentions() {
            let target = match (&annotation.kind, &annotation.user) {
                (AnnotationKind::TextMention, Some(user)) => Target::User(user.clone()),
                (AnnotationKind::Mention, _) => match annotation.handle(&message.text) {
                    Some(handle) if !handle.is_empty() => Target::Handle(handle.to_string()),
                    _ => continue,
                },
                _ => continue,
            };
            if !targets.iter().any(|seen| same_target(seen, &target)) {
                targets.push(target);
            }
        }

        let named_others = targets.iter().any(|target| !self.is_bot(target));
        if named_others {
            targets.retain(|target| !self.is_bot(target));
        }
        targets
    }

    /// Question text if `message` is addressed to the bot.
    fn query(&self, message: &InboundMessage) -> Option<String> {
        let mentions: Vec<&str> = message
            .annotations
            .iter()
            .filter(|annotation| {
                annotation
                    .handle(&message.text)
                    .is_some_and(|handle| self.is_bot_handle(handle))
            })
            .filter_map(|annotation| annotation.span(&message.text))
            .collect();
        if !mentions.is_empty() {
            let mut text = message.text.clone();
            for mention in mentions {
                text = text.replace(mention, "");
            }
            return Some(text.trim().to_string());
        }

        let replied_to_bot = message
            .reply_to
            .as_ref()
            .is_some_and(|author| author.id == self.bot.id);
        replied_to_bot.then(|| message.text.trim().to_string())
    }

    fn is_bot(&self, target: &Target) -> bool {
        match target {
            Target::User(user) => user.id == self.bot.id,
            Target::Handle(handle) => self.is_bot_handle(handle),
        }
    }

    fn is_bot_handle(&self, handle: &str) -> bool {
        handle.eq_ignore_ascii_case(&self.bot.handle)
    }
}

fn same_target(a: &Target, b: &Target) -> bool {
    match (a, b) {
        (Target::User(a), Target::User(b)) => a.id == b.id,
        (Target::Handle(a), Target::Handle(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}
