//! Game engine.
//!
//! Pure decision logic for the two mini-games:
//! - Duel: two players take turns, each shot hits with probability 1/2.
//! - Roulette: two or more players pass a revolver, each pull fires with
//!   probability 1/6.
//!
//! The engine never retains sessions between calls. Callers own the session
//! values and the [GameRng], and apply the returned [TurnResult] to the
//! leaderboard.

pub mod duel;
pub mod roulette;

use duelbot_types::{game::CHAMBERS, ChallengeRequest, SessionKey, UserId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use thiserror::Error;

pub use duel::{Duel, Shot};
pub use roulette::Roulette;

/// Source of game randomness.
///
/// Seeded from OS entropy in production and from a fixed value in tests so
/// outcomes can be replayed.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha20Rng,
}

impl GameRng {
    pub fn from_entropy() -> Self {
        Self {
            inner: ChaCha20Rng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Get a random value in range [0, max).
    pub fn next_bounded(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        self.inner.gen_range(0..max)
    }

    /// Fair coin.
    pub fn coin_flip(&mut self) -> bool {
        self.inner.gen_bool(0.5)
    }

    /// Chamber in [0, CHAMBERS).
    pub fn spin_cylinder(&mut self) -> u8 {
        self.inner.gen_range(0..CHAMBERS)
    }
}

/// Outcome of a legal turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnResult {
    /// Nobody was hurt; `next` acts now.
    Continue { next: UserId },
    /// `loser` is out but the game goes on with `next`.
    Eliminated { loser: UserId, next: UserId },
    /// Game over. `winner` is `None` when nobody is left standing.
    Finished {
        winner: Option<UserId>,
        loser: UserId,
    },
}

/// Legality failures. None of them mutate state.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("cannot challenge yourself")]
    SelfChallenge,
    #[error("cannot challenge the bot")]
    BotChallenge,
    #[error("not your turn, {expected} acts now")]
    NotYourTurn { expected: UserId },
    #[error("challenge is addressed to {expected}")]
    NotChallenged { expected: UserId },
    #[error("no pending challenge")]
    NoPendingChallenge,
    #[error("session not found")]
    SessionNotFound,
    #[error("need at least two participants, got {got}")]
    NotEnoughPlayers { got: usize },
    #[error("participant listed twice")]
    DuplicateParticipant,
    #[error("game already complete")]
    GameAlreadyComplete,
}

/// Turn-based game implementation.
pub trait TurnGame {
    type Session;

    /// Create a fresh session anchored at `key`.
    fn start(
        key: SessionKey,
        participants: Vec<UserId>,
        rng: &mut GameRng,
    ) -> Result<Self::Session, GameError>;

    /// Resolve a turn taken by `actor`.
    ///
    /// An actor other than the current one is refused before any randomness
    /// is drawn.
    fn process_turn(
        session: &mut Self::Session,
        actor: UserId,
        rng: &mut GameRng,
    ) -> Result<TurnResult, GameError>;
}

/// Check that `initiator` may challenge `target`.
pub fn validate_challenge(bot: UserId, initiator: UserId, target: UserId) -> Result<(), GameError> {
    if target == bot {
        return Err(GameError::BotChallenge);
    }
    if target == initiator {
        return Err(GameError::SelfChallenge);
    }
    Ok(())
}

/// Check that `actor` may accept `request`.
pub fn validate_acceptance(request: &ChallengeRequest, actor: UserId) -> Result<(), GameError> {
    if request.challenged != actor {
        return Err(GameError::NotChallenged {
            expected: request.challenged,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use duelbot_types::{GameKind, MessageId};

    #[test]
    fn test_game_rng_deterministic() {
        let mut rng1 = GameRng::seeded(7);
        let mut rng2 = GameRng::seeded(7);
        for _ in 0..100 {
            assert_eq!(rng1.next_bounded(1000), rng2.next_bounded(1000));
        }
    }

    #[test]
    fn test_game_rng_bounded() {
        let mut rng = GameRng::seeded(1);
        for _ in 0..1000 {
            assert!(rng.next_bounded(3) < 3);
            assert!(rng.spin_cylinder() < CHAMBERS);
        }
        assert_eq!(rng.next_bounded(0), 0);
    }

    #[test]
    fn test_game_rng_coin_is_fair_enough() {
        let mut rng = GameRng::seeded(3);
        let heads = (0..1000).filter(|_| rng.coin_flip()).count();
        assert!((400..600).contains(&heads), "heads: {heads}");
    }

    #[test]
    fn test_validate_challenge() {
        let bot = UserId(99);
        assert_eq!(
            validate_challenge(bot, UserId(1), bot),
            Err(GameError::BotChallenge)
        );
        assert_eq!(
            validate_challenge(bot, UserId(1), UserId(1)),
            Err(GameError::SelfChallenge)
        );
        assert_eq!(validate_challenge(bot, UserId(1), UserId(2)), Ok(()));
    }

    #[test]
    fn test_validate_acceptance() {
        let request = ChallengeRequest {
            initiator: UserId(1),
            challenged: UserId(2),
            kind: GameKind::Duel,
            anchor: MessageId(7),
        };
        assert_eq!(validate_acceptance(&request, UserId(2)), Ok(()));
        assert_eq!(
            validate_acceptance(&request, UserId(3)),
            Err(GameError::NotChallenged {
                expected: UserId(2)
            })
        );
    }
}
