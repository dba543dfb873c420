//! Game engine and session orchestration.
//!
//! The [games] module holds pure turn logic. [Layer] drives it against the
//! [IdentityDirectory], [Leaderboard] and [SessionRegistry] stores and emits
//! [Notification]s for the transport.

pub mod games;

mod directory;
mod layer;
mod leaderboard;
mod registry;

#[cfg(test)]
mod mocks;

pub use directory::IdentityDirectory;
pub use games::{GameError, GameRng, TurnResult};
pub use layer::{messages, Button, Intent, Layer, Notification, Target};
pub use leaderboard::Leaderboard;
pub use registry::SessionRegistry;
