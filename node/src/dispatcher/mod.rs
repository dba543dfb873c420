//! Single consumer of inbound events.
//!
//! The [Actor] exclusively owns the game [Layer] and therefore every session,
//! challenge, statistic and known handle. Other tasks reach it only through
//! its [Mailbox].

mod actor;
mod ingress;

use crate::{assistant::Assistant, completer::Completer, router::Router, transport::Transport};
pub use actor::Actor;
use duelbot_execution::Layer;
pub use ingress::{Mailbox, MailboxError, Message};
use std::sync::Arc;

pub struct Config<T: Transport, C: Completer> {
    pub transport: T,
    pub layer: Layer,
    pub router: Router,
    pub assistant: Arc<Assistant<C>>,
    pub mailbox_size: usize,
}
