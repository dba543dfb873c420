//! Live sessions and pending challenges.

use duelbot_types::{ChallengeRequest, DuelSession, RouletteSession, SessionKey, UserId};
use std::collections::HashMap;

/// Owner of every live session.
///
/// Duels and roulette games are kept in separate maps keyed by the message
/// that anchored them. Pending challenges are keyed by initiator, so a user
/// has at most one open challenge.
#[derive(Clone, Debug, Default)]
pub struct SessionRegistry {
    challenges: HashMap<UserId, ChallengeRequest>,
    duels: HashMap<SessionKey, DuelSession>,
    roulettes: HashMap<SessionKey, RouletteSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a challenge, returning the one it replaced.
    pub fn insert_challenge(&mut self, request: ChallengeRequest) -> Option<ChallengeRequest> {
        self.challenges.insert(request.initiator, request)
    }

    pub fn challenge(&self, initiator: UserId) -> Option<&ChallengeRequest> {
        self.challenges.get(&initiator)
    }

    pub fn take_challenge(&mut self, initiator: UserId) -> Option<ChallengeRequest> {
        self.challenges.remove(&initiator)
    }

    pub fn insert_duel(&mut self, session: DuelSession) {
        self.duels.insert(session.key, session);
    }

    pub fn duel(&self, key: &SessionKey) -> Option<&DuelSession> {
        self.duels.get(key)
    }

    pub fn duel_mut(&mut self, key: &SessionKey) -> Option<&mut DuelSession> {
        self.duels.get_mut(key)
    }

    pub fn remove_duel(&mut self, key: &SessionKey) -> Option<DuelSession> {
        self.duels.remove(key)
    }

    pub fn insert_roulette(&mut self, session: RouletteSession) {
        self.roulettes.insert(session.key, session);
    }

    pub fn roulette(&self, key: &SessionKey) -> Option<&RouletteSession> {
        self.roulettes.get(key)
    }

    pub fn roulette_mut(&mut self, key: &SessionKey) -> Option<&mut RouletteSession> {
        self.roulettes.get_mut(key)
    }

    pub fn remove_roulette(&mut self, key: &SessionKey) -> Option<RouletteSession> {
        self.roulettes.remove(key)
    }

    pub fn pending_challenges(&self) -> usize {
        self.challenges.len()
    }

    pub fn live_sessions(&self) -> usize {
        self.duels.len() + self.roulettes.len()
    }
}
