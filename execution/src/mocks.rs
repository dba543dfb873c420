//! Helpers for building orchestrators in tests.

use crate::{GameRng, IdentityDirectory, Intent, Layer, Leaderboard, SessionRegistry};
use duelbot_types::{ChatId, GameKind, MessageId, User, UserId};

/// Identifier of the bot in test layers.
pub const BOT_ID: UserId = UserId(999);
pub const BOT_HANDLE: &str = "duel_bot";

/// Chat used by test scenarios.
pub const CHAT: ChatId = ChatId(-100);

pub fn create_user(id: i64, handle: &str) -> User {
    User::new(id, handle)
}

pub fn create_bot() -> User {
    User::new(BOT_ID, BOT_HANDLE)
}

/// Layer with empty stores and a seeded rng.
pub fn create_layer(seed: u64) -> Layer {
    create_layer_with(seed, Leaderboard::new())
}

/// Layer over an existing leaderboard. The bot is pre-registered in the
/// directory.
pub fn create_layer_with(seed: u64, leaderboard: Leaderboard) -> Layer {
    let mut directory = IdentityDirectory::new();
    directory.observe(BOT_ID, BOT_HANDLE);
    Layer::new(
        BOT_ID,
        directory,
        leaderboard,
        SessionRegistry::new(),
        GameRng::seeded(seed),
    )
}

pub fn challenge_intent(kind: GameKind, anchor: i64, initiator: &User, target: &User) -> Intent {
    Intent::Challenge {
        kind,
        chat: CHAT,
        anchor: MessageId(anchor),
        initiator: initiator.clone(),
        target: crate::Target::User(target.clone()),
    }
}

pub fn accept_intent(kind: GameKind, anchor: i64, actor: &User, initiator: &User) -> Intent {
    Intent::Accept {
        kind,
        chat: CHAT,
        actor: actor.clone(),
        initiator: initiator.id,
        session: MessageId(anchor),
    }
}

pub fn act_intent(kind: GameKind, anchor: i64, actor: &User) -> Intent {
    Intent::Act {
        kind,
        chat: CHAT,
        actor: actor.clone(),
        session: MessageId(anchor),
    }
}
