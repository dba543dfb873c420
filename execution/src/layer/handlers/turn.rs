use super::super::*;
use crate::games::{Duel, Roulette, Shot, TurnGame, TurnResult};
use tracing::info;

impl Layer {
    // === Turn Handler Methods ===

    /// Turn prompt for a duel, optionally preceded by the previous outcome.
    pub(in crate::layer) fn shoot_prompt(
        &self,
        key: SessionKey,
        shooter: UserId,
        preface: Option<String>,
    ) -> Notification {
        let turn = messages::shoot_turn(&self.handle(shooter));
        Notification::prompt(
            key.chat,
            match preface {
                Some(preface) => format!("{preface}\n{turn}"),
                None => turn,
            },
            vec![Button::new(
                messages::SHOOT_LABEL,
                Action::Act {
                    kind: GameKind::Duel,
                    session: key.message,
                },
            )],
        )
    }

    pub(in crate::layer) fn pull_prompt(
        &self,
        key: SessionKey,
        player: UserId,
        preface: Option<String>,
    ) -> Notification {
        let turn = messages::pull_turn(&self.handle(player));
        Notification::prompt(
            key.chat,
            match preface {
                Some(preface) => format!("{preface}\n{turn}"),
                None => turn,
            },
            vec![Button::new(
                messages::PULL_LABEL,
                Action::Act {
                    kind: GameKind::Roulette,
                    session: key.message,
                },
            )],
        )
    }

    fn settle(&mut self, winner: Option<UserId>, loser: UserId) {
        self.leaderboard.record_loss(loser);
        if let Some(winner) = winner {
            self.leaderboard.record_win(winner);
        }
    }

    pub(in crate::layer) fn handle_shoot(
        &mut self,
        key: SessionKey,
        actor: &User,
    ) -> Vec<Notification> {
        let Some(session) = self.registry.duel_mut(&key) else {
            return self.refuse(key.chat, GameKind::Duel, actor, GameError::SessionNotFound);
        };
        let shot = match Duel::shoot(session, actor.id, &mut self.rng) {
            Ok(shot) => shot,
            Err(error) => return self.refuse(key.chat, GameKind::Duel, actor, error),
        };

        match shot {
            Shot::Missed { next } => {
                debug!(chat = %key.chat, session = %key.message, shooter = %actor.id, "duel miss");
                vec![self.shoot_prompt(key, next, Some(messages::missed(&actor.handle)))]
            }
            Shot::Hit { winner, loser } => {
                self.registry.remove_duel(&key);
                self.settle(Some(winner), loser);
                info!(chat = %key.chat, session = %key.message, %winner, %loser, "duel finished");
                vec![Notification::text(
                    key.chat,
                    messages::duel_won(&self.handle(winner)),
                )]
            }
        }
    }

    pub(in crate::layer) fn handle_pull(
        &mut self,
        key: SessionKey,
        actor: &User,
    ) -> Vec<Notification> {
        let Some(session) = self.registry.roulette_mut(&key) else {
            return self.refuse(key.chat, GameKind::Roulette, actor, GameError::SessionNotFound);
        };
        let result = match Roulette::process_turn(session, actor.id, &mut self.rng) {
            Ok(result) => result,
            Err(error) => return self.refuse(key.chat, GameKind::Roulette, actor, error),
        };

        match result {
            TurnResult::Continue { next } => {
                debug!(chat = %key.chat, session = %key.message, player = %actor.id, "empty chamber");
                vec![self.pull_prompt(key, next, Some(messages::click(&actor.handle)))]
            }
            TurnResult::Eliminated { loser, next } => {
                self.leaderboard.record_loss(loser);
                info!(chat = %key.chat, session = %key.message, %loser, "player eliminated");
                vec![self.pull_prompt(key, next, Some(messages::bang(&self.handle(loser))))]
            }
            TurnResult::Finished { winner, loser } => {
                self.registry.remove_roulette(&key);
                self.settle(winner, loser);
                info!(chat = %key.chat, session = %key.message, winner = ?winner, %loser, "roulette finished");
                let outcome = match winner {
                    Some(winner) => messages::roulette_won(&self.handle(winner)),
                    None => messages::ROULETTE_NO_SURVIVORS.to_string(),
                };
                vec![Notification::text(
                    key.chat,
                    format!("{}\n{outcome}", messages::bang(&self.handle(loser))),
                )]
            }
        }
    }
}
