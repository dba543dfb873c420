use duelbot_client::{InlineButton, Telegram};
use duelbot_execution::{Button, Notification};
use duelbot_types::ChatId;
use std::future::Future;
#[cfg(test)]
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Trait for delivering output to the chat platform.
pub trait Transport: Clone + Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Post plain text.
    fn send_text(
        &self,
        chat: ChatId,
        text: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Post text with a row of action buttons.
    fn send_text_with_actions(
        &self,
        chat: ChatId,
        text: &str,
        buttons: &[Button],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Show a "typing" indicator.
    fn send_typing_indicator(
        &self,
        chat: ChatId,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Acknowledge a button press so the client stops its spinner.
    fn acknowledge(&self, callback: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Deliver `notification`, logging (and otherwise ignoring) failures.
pub async fn deliver<T: Transport>(transport: &T, notification: &Notification) {
    let result = match notification {
        Notification::Text { chat, text } => transport.send_text(*chat, text).await,
        Notification::Prompt {
            chat,
            text,
            buttons,
        } => transport.send_text_with_actions(*chat, text, buttons).await,
    };
    if let Err(err) = result {
        warn!(chat = %notification.chat(), ?err, "failed to send notification");
    }
}

impl Transport for Telegram {
    type Error = duelbot_client::Error;

    async fn send_text(&self, chat: ChatId, text: &str) -> Result<(), Self::Error> {
        self.send_message(chat, text, &[]).await?;
        Ok(())
    }

    async fn send_text_with_actions(
        &self,
        chat: ChatId,
        text: &str,
        buttons: &[Button],
    ) -> Result<(), Self::Error> {
        let buttons: Vec<InlineButton> = buttons
            .iter()
            .map(|button| InlineButton::new(button.label.clone(), button.action.to_string()))
            .collect();
        self.send_message(chat, text, &buttons).await?;
        Ok(())
    }

    async fn send_typing_indicator(&self, chat: ChatId) -> Result<(), Self::Error> {
        self.send_typing(chat).await
    }

    async fn acknowledge(&self, callback: &str) -> Result<(), Self::Error> {
        self.answer_callback_query(callback).await
    }
}

/// Something the [Mock] transport was asked to do.
#[cfg(test)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sent {
    Text {
        chat: ChatId,
        text: String,
    },
    /// Buttons are recorded as `(label, payload)`.
    Actions {
        chat: ChatId,
        text: String,
        buttons: Vec<(String, String)>,
    },
    Typing {
        chat: ChatId,
    },
    Acknowledged {
        callback: String,
    },
}

#[cfg(test)]
impl Sent {
    pub fn body(&self) -> Option<&str> {
        match self {
            Sent::Text { text, .. } | Sent::Actions { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// A mock transport that records everything it is asked to send.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct Mock {
    pub sent: Arc<Mutex<Vec<Sent>>>,
    /// When set, every call fails after being recorded.
    pub failing: Arc<Mutex<bool>>,
}

#[cfg(test)]
impl Mock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Bodies of every text sent so far.
    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .iter()
            .filter_map(|sent| sent.body().map(str::to_string))
            .collect()
    }

    fn record(&self, sent: Sent) -> Result<(), std::io::Error> {
        self.sent.lock().unwrap().push(sent);
        if *self.failing.lock().unwrap() {
            return Err(std::io::Error::other("transport unavailable"));
        }
        Ok(())
    }
}

#[cfg(test)]
impl Transport for Mock {
    type Error = std::io::Error;

    async fn send_text(&self, chat: ChatId, text: &str) -> Result<(), Self::Error> {
        self.record(Sent::Text {
            chat,
            text: text.to_string(),
        })
    }

    async fn send_text_with_actions(
        &self,
        chat: ChatId,
        text: &str,
        buttons: &[Button],
    ) -> Result<(), Self::Error> {
        self.record(Sent::Actions {
            chat,
            text: text.to_string(),
            buttons: buttons
                .iter()
                .map(|button| (button.label.clone(), button.action.to_string()))
                .collect(),
        })
    }

    async fn send_typing_indicator(&self, chat: ChatId) -> Result<(), Self::Error> {
        self.record(Sent::Typing { chat })
    }

    async fn acknowledge(&self, callback: &str) -> Result<(), Self::Error> {
        self.record(Sent::Acknowledged {
            callback: callback.to_string(),
        })
    }
}
