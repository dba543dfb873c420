//! Action button payloads.
//!
//! Payload format (`|`-separated, ids in decimal):
//! - `accept_duel|<initiator>|<session>`
//! - `reject_duel|<initiator>`
//! - `shoot|<session>`
//! - `accept_roulette|<initiator>|<session>`
//! - `reject_roulette|<initiator>`
//! - `pull_trigger|<session>`
//!
//! `<session>` is the id of the message that anchored the game. The chat is
//! implied by where the button was pressed.

use super::GameKind;
use crate::identity::{MessageId, UserId};
use std::{fmt, str::FromStr};
use thiserror::Error;

const ACCEPT_DUEL: &str = "accept_duel";
const REJECT_DUEL: &str = "reject_duel";
const SHOOT: &str = "shoot";
const ACCEPT_ROULETTE: &str = "accept_roulette";
const REJECT_ROULETTE: &str = "reject_roulette";
const PULL_TRIGGER: &str = "pull_trigger";

const SEPARATOR: char = '|';

/// Action attached to a button and echoed back on press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Accept {
        kind: GameKind,
        initiator: UserId,
        session: MessageId,
    },
    Reject {
        kind: GameKind,
        initiator: UserId,
    },
    /// `shoot` for duels, `pull_trigger` for roulette.
    Act { kind: GameKind, session: MessageId },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseActionError {
    #[error("unknown action tag: {0}")]
    UnknownTag(String),
    #[error("{tag} expects {expected} fields, got {got}")]
    Arity {
        tag: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("invalid id in {tag}: {value}")]
    InvalidId { tag: &'static str, value: String },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Action::Accept {
                kind,
                initiator,
                session,
            } => {
                let tag = match kind {
                    GameKind::Duel => ACCEPT_DUEL,
                    GameKind::Roulette => ACCEPT_ROULETTE,
                };
                write!(f, "{tag}{SEPARATOR}{initiator}{SEPARATOR}{session}")
            }
            Action::Reject { kind, initiator } => {
                let tag = match kind {
                    GameKind::Duel => REJECT_DUEL,
                    GameKind::Roulette => REJECT_ROULETTE,
                };
                write!(f, "{tag}{SEPARATOR}{initiator}")
            }
            Action::Act { kind, session } => {
                let tag = match kind {
                    GameKind::Duel => SHOOT,
                    GameKind::Roulette => PULL_TRIGGER,
                };
                write!(f, "{tag}{SEPARATOR}{session}")
            }
        }
    }
}

fn parse_id<T: FromStr>(tag: &'static str, value: &str) -> Result<T, ParseActionError> {
    value.parse().map_err(|_| ParseActionError::InvalidId {
        tag,
        value: value.to_string(),
    })
}

fn expect_fields(
    tag: &'static str,
    fields: &[&str],
    expected: usize,
) -> Result<(), ParseActionError> {
    if fields.len() != expected {
        return Err(ParseActionError::Arity {
            tag,
            expected,
            got: fields.len(),
        });
    }
    Ok(())
}

impl FromStr for Action {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(SEPARATOR);
        let tag = parts.next().unwrap_or_default();
        let fields: Vec<&str> = parts.collect();

        let (tag, kind): (&'static str, GameKind) = match tag {
            ACCEPT_DUEL => (ACCEPT_DUEL, GameKind::Duel),
            REJECT_DUEL => (REJECT_DUEL, GameKind::Duel),
            SHOOT => (SHOOT, GameKind::Duel),
            ACCEPT_ROULETTE => (ACCEPT_ROULETTE, GameKind::Roulette),
            REJECT_ROULETTE => (REJECT_ROULETTE, GameKind::Roulette),
            PULL_TRIGGER => (PULL_TRIGGER, GameKind::Roulette),
            other => return Err(ParseActionError::UnknownTag(other.to_string())),
        };

        match tag {
            ACCEPT_DUEL | ACCEPT_ROULETTE => {
                expect_fields(tag, &fields, 2)?;
                Ok(Action::Accept {
                    kind,
                    initiator: parse_id(tag, fields[0])?,
                    session: parse_id(tag, fields[1])?,
                })
            }
            REJECT_DUEL | REJECT_ROULETTE => {
                expect_fields(tag, &fields, 1)?;
                Ok(Action::Reject {
                    kind,
                    initiator: parse_id(tag, fields[0])?,
                })
            }
            _ => {
                expect_fields(tag, &fields, 1)?;
                Ok(Action::Act {
                    kind,
                    session: parse_id(tag, fields[0])?,
                })
            }
        }
    }
}
