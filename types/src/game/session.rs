use super::GameKind;
use crate::identity::{ChatId, MessageId, UserId};

/// Registry key of a live session: the message that anchored it.
///
/// Message ids are only unique within a chat, so the chat is part of the key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey {
    pub chat: ChatId,
    pub message: MessageId,
}

impl SessionKey {
    pub fn new(chat: ChatId, message: MessageId) -> Self {
        Self { chat, message }
    }
}

/// Pending invitation awaiting accept or reject. Keyed by initiator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChallengeRequest {
    pub initiator: UserId,
    pub challenged: UserId,
    pub kind: GameKind,
    /// Message that issued the challenge; becomes the session key.
    pub anchor: MessageId,
}

/// Two-player duel. Only `participants[turn]` may shoot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DuelSession {
    pub key: SessionKey,
    pub participants: [UserId; 2],
    pub turn: usize,
}

impl DuelSession {
    /// Participant allowed to act.
    pub fn shooter(&self) -> UserId {
        self.participants[self.turn]
    }

    /// Participant waiting for their turn.
    pub fn opponent(&self) -> UserId {
        self.participants[1 - self.turn]
    }
}

/// Russian roulette between two or more players.
///
/// `participants` shrinks in place as players are eliminated; `turn` always
/// indexes into it while the session is live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouletteSession {
    pub key: SessionKey,
    pub participants: Vec<UserId>,
    pub turn: usize,
    pub loaded_chamber: u8,
}

impl RouletteSession {
    /// Participant holding the revolver, if anyone is left.
    pub fn current(&self) -> Option<UserId> {
        self.participants.get(self.turn).copied()
    }

    pub fn remaining(&self) -> usize {
        self.participants.len()
    }
}
