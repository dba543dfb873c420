use super::super::*;
use crate::games::{validate_acceptance, validate_challenge, Duel, Roulette, TurnGame};
use duelbot_types::{ChallengeRequest, DuelSession, RouletteSession};
use tracing::info;

impl Target {
    fn label(&self) -> &str {
        match self {
            Target::User(user) => &user.handle,
            Target::Handle(handle) => handle,
        }
    }
}

impl Layer {
    // === Challenge Handler Methods ===

    fn resolve(&mut self, target: &Target) -> Option<UserId> {
        match target {
            Target::User(user) => {
                self.directory.observe_user(user);
                Some(user.id)
            }
            Target::Handle(handle) => self.directory.resolve(handle),
        }
    }

    pub(in crate::layer) fn handle_challenge(
        &mut self,
        kind: GameKind,
        chat: ChatId,
        anchor: MessageId,
        initiator: &User,
        target: Target,
    ) -> Vec<Notification> {
        let Some(challenged) = self.resolve(&target) else {
            return vec![Notification::text(
                chat,
                messages::user_not_found(target.label()),
            )];
        };
        self.issue_challenge(kind, chat, anchor, initiator, challenged)
    }

    pub(in crate::layer) fn handle_start_roulette(
        &mut self,
        chat: ChatId,
        anchor: MessageId,
        initiator: &User,
        targets: Vec<Target>,
    ) -> Vec<Notification> {
        let mut participants: Vec<UserId> = Vec::with_capacity(targets.len());
        let mut unresolved = None;
        for target in &targets {
            match self.resolve(target) {
                Some(id) if id == self.bot => {}
                Some(id) => {
                    if !participants.contains(&id) {
                        participants.push(id);
                    }
                }
                None => {
                    unresolved.get_or_insert(target.label());
                }
            }
        }

        match participants.len() {
            0 => {
                let text = match unresolved {
                    Some(handle) => messages::user_not_found(handle),
                    None => messages::NOT_ENOUGH_PLAYERS.to_string(),
                };
                vec![Notification::text(chat, text)]
            }
            1 => self.issue_challenge(GameKind::Roulette, chat, anchor, initiator, participants[0]),
            _ => {
                let key = SessionKey::new(chat, anchor);
                match Roulette::start(key, participants, &mut self.rng) {
                    Ok(session) => self.begin_roulette(session),
                    Err(error) => self.refuse(chat, GameKind::Roulette, initiator, error),
                }
            }
        }
    }

    fn issue_challenge(
        &mut self,
        kind: GameKind,
        chat: ChatId,
        anchor: MessageId,
        initiator: &User,
        challenged: UserId,
    ) -> Vec<Notification> {
        if let Err(error) = validate_challenge(self.bot, initiator.id, challenged) {
            return self.refuse(chat, kind, initiator, error);
        }

        let request = ChallengeRequest {
            initiator: initiator.id,
            challenged,
            kind,
            anchor,
        };
        if let Some(replaced) = self.registry.insert_challenge(request) {
            debug!(
                initiator = %initiator.id,
                previous = %replaced.challenged,
                "pending challenge replaced"
            );
        }
        info!(%chat, initiator = %initiator.id, %challenged, %kind, "challenge issued");

        let target = self.handle(challenged);
        vec![Notification::prompt(
            chat,
            messages::challenge(kind, &initiator.handle, &target),
            vec![
                Button::new(
                    messages::ACCEPT_LABEL,
                    Action::Accept {
                        kind,
                        initiator: initiator.id,
                        session: anchor,
                    },
                ),
                Button::new(
                    messages::REJECT_LABEL,
                    Action::Reject {
                        kind,
                        initiator: initiator.id,
                    },
                ),
            ],
        )]
    }

    /// Pending request of `kind` from `initiator`, if any.
    fn pending(&self, kind: GameKind, initiator: UserId) -> Result<ChallengeRequest, GameError> {
        match self.registry.challenge(initiator) {
            Some(request) if request.kind == kind => Ok(*request),
            _ => Err(GameError::NoPendingChallenge),
        }
    }

    pub(in crate::layer) fn handle_accept(
        &mut self,
        kind: GameKind,
        chat: ChatId,
        actor: &User,
        initiator: UserId,
        session: MessageId,
    ) -> Vec<Notification> {
        // A button from an earlier challenge by the same initiator is stale
        let request = match self
            .pending(kind, initiator)
            .and_then(|request| {
                if request.anchor == session {
                    Ok(request)
                } else {
                    Err(GameError::NoPendingChallenge)
                }
            })
            .and_then(|request| validate_acceptance(&request, actor.id).map(|_| request))
        {
            Ok(request) => request,
            Err(error) => return self.refuse(chat, kind, actor, error),
        };

        let key = SessionKey::new(chat, session);
        let participants = vec![request.initiator, request.challenged];
        let notifications = match kind {
            GameKind::Duel => match Duel::start(key, participants, &mut self.rng) {
                Ok(session) => self.begin_duel(session),
                Err(error) => return self.refuse(chat, kind, actor, error),
            },
            GameKind::Roulette => match Roulette::start(key, participants, &mut self.rng) {
                Ok(session) => self.begin_roulette(session),
                Err(error) => return self.refuse(chat, kind, actor, error),
            },
        };
        self.registry.take_challenge(initiator);
        notifications
    }

    pub(in crate::layer) fn handle_reject(
        &mut self,
        kind: GameKind,
        chat: ChatId,
        actor: &User,
        initiator: UserId,
    ) -> Vec<Notification> {
        if let Err(error) = self.pending(kind, initiator) {
            return self.refuse(chat, kind, actor, error);
        }
        self.registry.take_challenge(initiator);
        info!(%chat, %initiator, user = %actor.id, %kind, "challenge rejected");
        vec![Notification::text(
            chat,
            messages::rejected(kind, &actor.handle),
        )]
    }

    fn begin_duel(&mut self, session: DuelSession) -> Vec<Notification> {
        let [first, second] = session.participants;
        info!(
            chat = %session.key.chat,
            session = %session.key.message,
            %first,
            %second,
            shooter = %session.shooter(),
            "duel started"
        );
        let notifications = vec![
            Notification::text(
                session.key.chat,
                messages::duel_started(&self.handle(first), &self.handle(second)),
            ),
            self.shoot_prompt(session.key, session.shooter(), None),
        ];
        self.registry.insert_duel(session);
        notifications
    }

    fn begin_roulette(&mut self, session: RouletteSession) -> Vec<Notification> {
        info!(
            chat = %session.key.chat,
            session = %session.key.message,
            players = session.remaining(),
            "roulette started"
        );
        let names: Vec<String> = session
            .participants
            .iter()
            .map(|user| self.handle(*user))
            .collect();
        let mut notifications = vec![Notification::text(
            session.key.chat,
            messages::roulette_started(&names),
        )];
        if let Some(current) = session.current() {
            notifications.push(self.pull_prompt(session.key, current, None));
        }
        self.registry.insert_roulette(session);
        notifications
    }
}
