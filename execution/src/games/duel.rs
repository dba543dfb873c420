//! Two-player duel.
//!
//! The first shooter is chosen by a coin flip. Each shot hits with
//! probability 1/2: a hit ends the game with the shooter as winner, a miss
//! hands the pistol to the opponent.

use super::{GameError, GameRng, TurnGame, TurnResult};
use duelbot_types::{DuelSession, SessionKey, UserId};

pub struct Duel;

/// Outcome of a single shot. A duel has no eliminations and no draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shot {
    Missed { next: UserId },
    Hit { winner: UserId, loser: UserId },
}

impl From<Shot> for TurnResult {
    fn from(shot: Shot) -> Self {
        match shot {
            Shot::Missed { next } => TurnResult::Continue { next },
            Shot::Hit { winner, loser } => TurnResult::Finished {
                winner: Some(winner),
                loser,
            },
        }
    }
}

impl Duel {
    /// Apply a shot whose outcome is already known.
    pub fn apply_shot(session: &mut DuelSession, hit: bool) -> Shot {
        let shooter = session.shooter();
        let opponent = session.opponent();
        if hit {
            return Shot::Hit {
                winner: shooter,
                loser: opponent,
            };
        }
        session.turn = 1 - session.turn;
        Shot::Missed { next: opponent }
    }

    /// Fire on behalf of `actor`, who must hold the pistol.
    pub fn shoot(
        session: &mut DuelSession,
        actor: UserId,
        rng: &mut GameRng,
    ) -> Result<Shot, GameError> {
        let shooter = session.shooter();
        if actor != shooter {
            return Err(GameError::NotYourTurn { expected: shooter });
        }
        let hit = rng.coin_flip();
        Ok(Self::apply_shot(session, hit))
    }
}

impl TurnGame for Duel {
    type Session = DuelSession;

    fn start(
        key: SessionKey,
        participants: Vec<UserId>,
        rng: &mut GameRng,
    ) -> Result<DuelSession, GameError> {
        let participants: [UserId; 2] = participants
            .try_into()
            .map_err(|rest: Vec<UserId>| GameError::NotEnoughPlayers { got: rest.len() })?;
        if participants[0] == participants[1] {
            return Err(GameError::DuplicateParticipant);
        }
        let turn = if rng.coin_flip() { 0 } else { 1 };
        Ok(DuelSession {
            key,
            participants,
            turn,
        })
    }

    fn process_turn(
        session: &mut DuelSession,
        actor: UserId,
        rng: &mut GameRng,
    ) -> Result<TurnResult, GameError> {
        Self::shoot(session, actor, rng).map(TurnResult::from)
    }
}
