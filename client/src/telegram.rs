//! Telegram Bot API client.
//!
//! Every method is a call to `{base}/bot{token}/{method}`. Replies are
//! wrapped in an envelope carrying `ok` plus either `result` or an error
//! description.

use crate::{client::TIMEOUT, updates::Stream, Client, Error, Result, RetryPolicy};
use duelbot_types::{
    Annotation, AnnotationKind, CallbackQuery as InboundCallback, ChatId, Inbound,
    InboundMessage, MessageId, User as InboundUser, UserId,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Pause before polling again after a failed `getUpdates`.
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(3);

/// Default root of the Bot API.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org/";

#[derive(Clone, Debug)]
pub struct Telegram {
    client: Client,
    token: String,
}

/// An inline keyboard button: label plus opaque callback data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

impl Telegram {
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: Client::new(base_url)?,
            token: token.into(),
        })
    }

    /// Returns a new client with the provided retry policy. Only reads are
    /// retried unless the policy says otherwise.
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.client.set_retry_policy(retry_policy);
        self
    }

    fn method_url(&self, method: &str) -> Result<url::Url> {
        // Tokens contain ':' which would otherwise parse as a scheme.
        self.client.join(&format!("./bot{}/{method}", self.token))
    }

    async fn call<B: Serialize, T: DeserializeOwned>(&self, method: &str, body: &B) -> Result<T> {
        let url = self.method_url(method)?;
        let response = self.client.post_json_with_retry(url, body, None).await?;
        parse_envelope(response).await
    }

    /// Identity of the bot itself.
    pub async fn get_me(&self) -> Result<InboundUser> {
        let url = self.method_url("getMe")?;
        let response = self.client.get_with_retry(url, TIMEOUT).await?;
        let user: User = parse_envelope(response).await?;
        Ok(user.into_user())
    }

    /// Long-poll for updates after `offset`, waiting up to `wait` for one to
    /// arrive.
    pub async fn get_updates(&self, offset: Option<i64>, wait: Duration) -> Result<Vec<Update>> {
        let mut url = self.method_url("getUpdates")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("timeout", &wait.as_secs().to_string());
            query.append_pair("allowed_updates", r#"["message","callback_query"]"#);
            if let Some(offset) = offset {
                query.append_pair("offset", &offset.to_string());
            }
        }
        let response = self.client.get_with_retry(url, wait + TIMEOUT).await?;
        parse_envelope(response).await
    }

    /// Post `text` to `chat`, with an optional single row of buttons.
    pub async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        buttons: &[InlineButton],
    ) -> Result<MessageId> {
        let reply_markup = (!buttons.is_empty()).then(|| InlineKeyboardMarkup {
            inline_keyboard: vec![buttons.to_vec()],
        });
        let request = SendMessage {
            chat_id: chat,
            text,
            reply_markup,
        };
        let message: Message = self.call("sendMessage", &request).await?;
        Ok(message.message_id)
    }

    /// Show the "typing" indicator in `chat`.
    pub async fn send_typing(&self, chat: ChatId) -> Result<()> {
        let request = SendChatAction {
            chat_id: chat,
            action: "typing",
        };
        let _: bool = self.call("sendChatAction", &request).await?;
        Ok(())
    }

    /// Stop the loading spinner on a pressed button.
    pub async fn answer_callback_query(&self, callback_query_id: &str) -> Result<()> {
        let request = AnswerCallbackQuery { callback_query_id };
        let _: bool = self.call("answerCallbackQuery", &request).await?;
        Ok(())
    }

    /// Poll updates in a background task.
    ///
    /// Updates that carry neither a text message nor a button press are
    /// skipped. Poll failures are forwarded to the stream and polling resumes
    /// after a short pause.
    pub fn connect_updates(&self, wait: Duration) -> Stream<Inbound> {
        self.connect_updates_with_capacity(wait, 0)
    }

    pub fn connect_updates_with_capacity(&self, wait: Duration, capacity: usize) -> Stream<Inbound> {
        let telegram = self.clone();
        Stream::spawn(capacity, move |tx| async move {
            let mut offset = None;
            loop {
                match telegram.get_updates(offset, wait).await {
                    Ok(updates) => {
                        debug!(count = updates.len(), "received updates");
                        for update in updates {
                            offset = Some(update.update_id + 1);
                            let Some(inbound) = update.into_inbound() else {
                                continue;
                            };
                            if tx.send(Ok(inbound)).await.is_err() {
                                return; // Receiver dropped
                            }
                        }
                    }
                    Err(err) => {
                        warn!(?err, "failed to poll updates");
                        if tx.send(Err(err)).await.is_err() {
                            return;
                        }
                        sleep(POLL_ERROR_BACKOFF).await;
                    }
                }
            }
        })
    }
}

async fn parse_envelope<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let bytes = response.bytes().await?;
    let envelope: Envelope<T> = match serde_json::from_slice(&bytes) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => return Err(Error::Failed(status)),
        Err(err) => return Err(Error::InvalidData(err)),
    };
    match envelope {
        Envelope {
            ok: true,
            result: Some(result),
            ..
        } => Ok(result),
        Envelope {
            error_code,
            description,
            ..
        } => Err(Error::Api {
            code: error_code.unwrap_or(i64::from(status.as_u16())),
            description: description.unwrap_or_default(),
        }),
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: ChatId,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Serialize)]
struct InlineKeyboardMarkup {
    inline_keyboard: Vec<Vec<InlineButton>>,
}

#[derive(Serialize)]
struct SendChatAction<'a> {
    chat_id: ChatId,
    action: &'a str,
}

#[derive(Serialize)]
struct AnswerCallbackQuery<'a> {
    callback_query_id: &'a str,
}

/// A single entry returned by `getUpdates`.
#[derive(Clone, Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Message {
    pub message_id: MessageId,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
    pub reply_to_message: Option<Box<Message>>,
    #[serde(default)]
    pub entities: Vec<MessageEntity>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub kind: String,
    pub offset: usize,
    pub length: usize,
    pub user: Option<User>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

impl User {
    /// Username when set, otherwise the first name.
    pub fn into_user(self) -> InboundUser {
        let handle = match self.username {
            Some(username) if !username.is_empty() => username,
            _ => self.first_name,
        };
        InboundUser::new(self.id, handle)
    }
}

impl From<MessageEntity> for Annotation {
    fn from(entity: MessageEntity) -> Self {
        Annotation {
            kind: AnnotationKind::from_wire(&entity.kind),
            offset: entity.offset,
            length: entity.length,
            user: entity.user.map(User::into_user),
        }
    }
}

impl Message {
    /// Text messages with a known sender; anything else is dropped.
    pub fn into_inbound(self) -> Option<InboundMessage> {
        let sender = self.from?.into_user();
        let text = self.text?;
        Some(InboundMessage {
            chat: self.chat.id,
            id: self.message_id,
            sender,
            text,
            reply_to: self
                .reply_to_message
                .and_then(|message| message.from)
                .map(User::into_user),
            annotations: self.entities.into_iter().map(Annotation::from).collect(),
        })
    }
}

impl CallbackQuery {
    /// Button presses on messages still visible to the bot.
    pub fn into_inbound(self) -> Option<InboundCallback> {
        Some(InboundCallback {
            id: self.id,
            chat: self.message?.chat.id,
            sender: self.from.into_user(),
            data: self.data?,
        })
    }
}

impl Update {
    pub fn into_inbound(self) -> Option<Inbound> {
        if let Some(message) = self.message {
            return message.into_inbound().map(Inbound::Message);
        }
        self.callback_query?
            .into_inbound()
            .map(Inbound::Callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_converts_reply_and_mentions() {
        let update: Update = serde_json::from_str(
            r#"{
                "update_id": 10,
                "message": {
                    "message_id": 55,
                    "chat": {"id": -100},
                    "from": {"id": 1, "is_bot": false, "first_name": "Alice", "username": "alice"},
                    "text": "дуэль @bob",
                    "reply_to_message": {
                        "message_id": 54,
                        "chat": {"id": -100},
                        "from": {"id": 2, "is_bot": false, "first_name": "Bob"}
                    },
                    "entities": [{"type": "mention", "offset": 6, "length": 4}]
                }
            }"#,
        )
        .expect("Failed to parse update");

        let Some(Inbound::Message(message)) = update.into_inbound() else {
            panic!("Expected message");
        };
        assert_eq!(message.chat, ChatId(-100));
        assert_eq!(message.id, MessageId(55));
        assert_eq!(message.sender, InboundUser::new(1, "alice"));
        // No username: falls back to the first name.
        assert_eq!(message.reply_to, Some(InboundUser::new(2, "Bob")));
        assert_eq!(message.annotations.len(), 1);
        assert_eq!(message.annotations[0].handle(&message.text), Some("bob"));
    }

    #[test]
    fn test_update_converts_callback() {
        let update: Update = serde_json::from_str(
            r#"{
                "update_id": 11,
                "callback_query": {
                    "id": "cb-1",
                    "from": {"id": 2, "is_bot": false, "first_name": "Bob", "username": "bob"},
                    "message": {"message_id": 56, "chat": {"id": -100}},
                    "data": "accept_duel|1|55"
                }
            }"#,
        )
        .expect("Failed to parse update");

        assert_eq!(
            update.into_inbound(),
            Some(Inbound::Callback(InboundCallback {
                id: "cb-1".to_string(),
                chat: ChatId(-100),
                sender: InboundUser::new(2, "bob"),
                data: "accept_duel|1|55".to_string(),
            }))
        );
    }

    #[test]
    fn test_non_text_updates_skipped() {
        let update: Update = serde_json::from_str(
            r#"{
                "update_id": 12,
                "message": {
                    "message_id": 57,
                    "chat": {"id": -100},
                    "from": {"id": 1, "first_name": "Alice"}
                }
            }"#,
        )
        .expect("Failed to parse update");
        assert_eq!(update.into_inbound(), None);
    }

    #[test]
    fn test_text_mention_carries_user() {
        let entity: MessageEntity = serde_json::from_str(
            r#"{"type": "text_mention", "offset": 0, "length": 3, "user": {"id": 7, "first_name": "Ann"}}"#,
        )
        .expect("Failed to parse entity");
        let annotation = Annotation::from(entity);
        assert_eq!(annotation.kind, AnnotationKind::TextMention);
        assert_eq!(annotation.user, Some(InboundUser::new(7, "Ann")));
    }
}
