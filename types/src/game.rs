//! Game sessions, challenges, statistics and the callback payload codec.

mod action;
mod constants;
mod session;
mod stat;


pub use action::{Action, ParseActionError};
pub use constants::*;
pub use session::{ChallengeRequest, DuelSession, RouletteSession, SessionKey};
pub use stat::{Standing, Stat};

use std::fmt;

/// Supported mini-games.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameKind {
    Duel,
    Roulette,
}

impl GameKind {
    /// Noun used in user-facing announcements ("вызывает ... на дуэль").
    pub fn noun(&self) -> &'static str {
        match self {
            GameKind::Duel => "дуэль",
            GameKind::Roulette => "русскую рулетку",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameKind::Duel => write!(f, "duel"),
            GameKind::Roulette => write!(f, "roulette"),
        }
    }
}
