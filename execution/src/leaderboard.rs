//! Win/loss counters.

use duelbot_types::{Standing, Stat, UserId};
use std::collections::HashMap;

/// Per-user statistics. Rows are created on first resolution and never
/// deleted; counters only grow.
#[derive(Clone, Debug, Default)]
pub struct Leaderboard {
    stats: HashMap<UserId, Stat>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_win(&mut self, user: UserId) {
        let stat = self.stats.entry(user).or_default();
        stat.wins = stat.wins.saturating_add(1);
    }

    pub fn record_loss(&mut self, user: UserId) {
        let stat = self.stats.entry(user).or_default();
        stat.losses = stat.losses.saturating_add(1);
    }

    pub fn get(&self, user: UserId) -> Option<Stat> {
        self.stats.get(&user).copied()
    }

    /// Rows ordered by wins (descending), then user id (ascending). Ranks
    /// start at 1.
    pub fn snapshot(&self) -> Vec<Standing> {
        let mut rows: Vec<(UserId, Stat)> = self.stats.iter().map(|(u, s)| (*u, *s)).collect();
        rows.sort_by(|(a_user, a), (b_user, b)| b.wins.cmp(&a.wins).then(a_user.cmp(b_user)));
        rows.into_iter()
            .zip(1u32..)
            .map(|((user, stat), rank)| Standing { user, stat, rank })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(board: &mut Leaderboard, user: i64, wins: u32, losses: u32) {
        for _ in 0..wins {
            board.record_win(UserId(user));
        }
        for _ in 0..losses {
            board.record_loss(UserId(user));
        }
    }

    #[test]
    fn test_lazy_creation() {
        let mut board = Leaderboard::new();
        assert!(board.is_empty());
        assert_eq!(board.get(UserId(1)), None);

        board.record_loss(UserId(1));
        assert_eq!(board.get(UserId(1)), Some(Stat::new(0, 1)));
        board.record_win(UserId(1));
        assert_eq!(board.get(UserId(1)), Some(Stat::new(1, 1)));
    }

    #[test]
    fn test_snapshot_order() {
        let mut board = Leaderboard::new();
        record(&mut board, 1, 3, 1); // A
        record(&mut board, 2, 5, 0); // B
        record(&mut board, 3, 0, 2); // C

        let snapshot = board.snapshot();
        let users: Vec<UserId> = snapshot.iter().map(|s| s.user).collect();
        assert_eq!(users, vec![UserId(2), UserId(1), UserId(3)]);
        let ranks: Vec<u32> = snapshot.iter().map(|s| s.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert_eq!(snapshot[0].stat, Stat::new(5, 0));
    }

    #[test]
    fn test_snapshot_tie_break_by_id() {
        let mut board = Leaderboard::new();
        record(&mut board, 9, 2, 0);
        record(&mut board, 4, 2, 3);
        record(&mut board, 7, 2, 1);

        let users: Vec<UserId> = board.snapshot().iter().map(|s| s.user).collect();
        assert_eq!(users, vec![UserId(4), UserId(7), UserId(9)]);
    }
}
