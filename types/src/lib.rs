//! Common types shared by the duelbot engine, clients and node.

pub mod event;
pub mod game;
pub mod identity;

pub use event::{Annotation, AnnotationKind, CallbackQuery, Inbound, InboundMessage};
pub use game::{
    Action, ChallengeRequest, DuelSession, GameKind, ParseActionError, RouletteSession,
    SessionKey, Standing, Stat,
};
pub use identity::{ChatId, MessageId, User, UserId};
