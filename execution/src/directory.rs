//! Handle <-> identifier mapping learned from observed events.

use duelbot_types::{User, UserId};
use std::collections::HashMap;

/// Bidirectional handle directory.
///
/// Entries are overwritten by the most recent observation and never removed.
/// The directory is not expected to be complete: users who never posted are
/// unknown until someone names them with a linked mention.
#[derive(Clone, Debug, Default)]
pub struct IdentityDirectory {
    by_handle: HashMap<String, UserId>,
    by_id: HashMap<UserId, String>,
}

impl IdentityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `handle` for `id`. Empty handles are ignored.
    pub fn observe(&mut self, id: UserId, handle: &str) {
        if handle.is_empty() {
            return;
        }
        self.by_handle.insert(handle.to_string(), id);
        self.by_id.insert(id, handle.to_string());
    }

    pub fn observe_user(&mut self, user: &User) {
        self.observe(user.id, &user.handle);
    }

    pub fn resolve(&self, handle: &str) -> Option<UserId> {
        self.by_handle.get(handle).copied()
    }

    /// Last-known handle, or the decimal id if none was ever seen.
    pub fn reverse(&self, id: UserId) -> String {
        self.by_id
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
