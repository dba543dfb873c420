//! Russian roulette for two or more players.
//!
//! One chamber is marked loaded when the session starts. Every pull draws a
//! fresh chamber and fires iff it matches, so each pull is an independent
//! 1-in-6 hazard. A player who is shot is removed from the circle; the last
//! one standing wins.

use super::{GameError, GameRng, TurnGame, TurnResult};
use duelbot_types::{game::MIN_ROULETTE_PLAYERS, RouletteSession, SessionKey, UserId};
use std::collections::HashSet;

pub struct Roulette;

impl Roulette {
    /// Apply a pull that landed on `chamber`.
    pub fn apply_pull(session: &mut RouletteSession, chamber: u8) -> Result<TurnResult, GameError> {
        let actor = session.current().ok_or(GameError::GameAlreadyComplete)?;

        if chamber != session.loaded_chamber {
            session.turn = (session.turn + 1) % session.remaining();
            let next = session.current().ok_or(GameError::GameAlreadyComplete)?;
            return Ok(TurnResult::Continue { next });
        }

        session.participants.remove(session.turn);
        match session.remaining() {
            0 => Ok(TurnResult::Finished {
                winner: None,
                loser: actor,
            }),
            1 => Ok(TurnResult::Finished {
                winner: session.participants.first().copied(),
                loser: actor,
            }),
            remaining => {
                // The next player slid into the eliminated player's slot.
                session.turn %= remaining;
                let next = session.current().ok_or(GameError::GameAlreadyComplete)?;
                Ok(TurnResult::Eliminated { loser: actor, next })
            }
        }
    }
}

impl TurnGame for Roulette {
    type Session = RouletteSession;

    fn start(
        key: SessionKey,
        participants: Vec<UserId>,
        rng: &mut GameRng,
    ) -> Result<RouletteSession, GameError> {
        if participants.len() < MIN_ROULETTE_PLAYERS {
            return Err(GameError::NotEnoughPlayers {
                got: participants.len(),
            });
        }
        let mut seen = HashSet::new();
        if !participants.iter().all(|p| seen.insert(*p)) {
            return Err(GameError::DuplicateParticipant);
        }

        let turn = rng.next_bounded(participants.len());
        let loaded_chamber = rng.spin_cylinder();
        Ok(RouletteSession {
            key,
            participants,
            turn,
            loaded_chamber,
        })
    }

    fn process_turn(
        session: &mut RouletteSession,
        actor: UserId,
        rng: &mut GameRng,
    ) -> Result<TurnResult, GameError> {
        let current = session.current().ok_or(GameError::GameAlreadyComplete)?;
        if actor != current {
            return Err(GameError::NotYourTurn { expected: current });
        }
        let chamber = rng.spin_cylinder();
        Self::apply_pull(session, chamber)
    }
}
