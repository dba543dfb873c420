//! Transport-independent inbound events.

use crate::identity::{ChatId, MessageId, User};

/// Event delivered by the chat transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inbound {
    Message(InboundMessage),
    Callback(CallbackQuery),
}

impl Inbound {
    pub fn sender(&self) -> &User {
        match self {
            Inbound::Message(message) => &message.sender,
            Inbound::Callback(callback) => &callback.sender,
        }
    }
}

/// A text message posted in a chat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    pub chat: ChatId,
    pub id: MessageId,
    pub sender: User,
    pub text: String,
    /// Author of the message this one replies to.
    pub reply_to: Option<User>,
    pub annotations: Vec<Annotation>,
}

impl InboundMessage {
    /// Annotations that name a user, in the order they appear.
    pub fn mentions(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter().filter(|annotation| {
            matches!(
                annotation.kind,
                AnnotationKind::Mention | AnnotationKind::TextMention
            )
        })
    }

    /// First `/command` in the message, without the slash and `@botname`
    /// suffix split off.
    pub fn command(&self) -> Option<(&str, Option<&str>)> {
        let annotation = self
            .annotations
            .iter()
            .find(|a| a.kind == AnnotationKind::BotCommand && a.offset == 0)?;
        let raw = annotation.span(&self.text)?.strip_prefix('/')?;
        Some(match raw.split_once('@') {
            Some((name, target)) => (name, Some(target)),
            None => (raw, None),
        })
    }
}

/// Kind of a formatting annotation attached to a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnnotationKind {
    /// `@handle` typed in the text.
    Mention,
    /// A name linked to a user without a public handle.
    TextMention,
    /// `/command` or `/command@botname`.
    BotCommand,
    Other(String),
}

impl AnnotationKind {
    pub fn from_wire(kind: &str) -> Self {
        match kind {
            "mention" => AnnotationKind::Mention,
            "text_mention" => AnnotationKind::TextMention,
            "bot_command" => AnnotationKind::BotCommand,
            other => AnnotationKind::Other(other.to_string()),
        }
    }
}

/// A typed span over message text.
///
/// `offset` and `length` count UTF-16 code units.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Annotation {
    pub kind: AnnotationKind,
    pub offset: usize,
    pub length: usize,
    /// Set for [AnnotationKind::TextMention].
    pub user: Option<User>,
}

impl Annotation {
    /// Text covered by this annotation, or `None` if the span falls outside
    /// `text` or splits a character.
    pub fn span<'a>(&self, text: &'a str) -> Option<&'a str> {
        utf16_slice(text, self.offset, self.length)
    }

    /// Handle named by a `@mention` span, without the `@`.
    pub fn handle<'a>(&self, text: &'a str) -> Option<&'a str> {
        match self.kind {
            AnnotationKind::Mention => self.span(text)?.strip_prefix('@'),
            _ => None,
        }
    }
}

/// Press of an action button.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallbackQuery {
    /// Transport handle used to acknowledge the press.
    pub id: String,
    pub chat: ChatId,
    pub sender: User,
    pub data: String,
}

fn utf16_slice(text: &str, offset: usize, length: usize) -> Option<&str> {
    let end = offset.checked_add(length)?;
    let mut start_byte = None;
    let mut end_byte = None;
    let mut units = 0;
    for (byte, ch) in text.char_indices() {
        if units == offset {
            start_byte = Some(byte);
        }
        if units == end {
            end_byte = Some(byte);
            break;
        }
        units += ch.len_utf16();
    }
    if end_byte.is_none() && units == end {
        end_byte = Some(text.len());
        if start_byte.is_none() && units == offset {
            start_byte = Some(text.len());
        }
    }
    text.get(start_byte?..end_byte?)
}
