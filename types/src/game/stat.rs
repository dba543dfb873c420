use crate::identity::UserId;

/// Win/loss counters for a single user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Stat {
    pub wins: u32,
    pub losses: u32,
}

impl Stat {
    pub fn new(wins: u32, losses: u32) -> Self {
        Self { wins, losses }
    }
}

/// A ranked leaderboard row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Standing {
    pub user: UserId,
    pub stat: Stat,
    pub rank: u32,
}
