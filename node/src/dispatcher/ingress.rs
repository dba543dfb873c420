use duelbot_types::{Inbound, Standing};
use futures::{
    channel::{mpsc, oneshot},
    SinkExt,
};
use thiserror::Error;

pub enum Message {
    Deliver(Inbound),
    Standings {
        response: oneshot::Sender<Vec<Standing>>,
    },
}

#[derive(Clone)]
pub struct Mailbox {
    sender: mpsc::Sender<Message>,
}

#[derive(Debug, Error)]
pub enum MailboxError {
    #[error("dispatcher mailbox closed")]
    Closed,
    #[error("dispatcher request canceled")]
    Canceled,
}

impl Mailbox {
    pub(super) fn new(sender: mpsc::Sender<Message>) -> Self {
        Self { sender }
    }

    /// Queue an inbound event. Waits while the mailbox is full.
    pub async fn deliver(&mut self, inbound: Inbound) -> Result<(), MailboxError> {
        self.sender
            .send(Message::Deliver(inbound))
            .await
            .map_err(|_| MailboxError::Closed)
    }

    /// Current leaderboard, after every event queued before this call.
    pub async fn standings(&mut self) -> Result<Vec<Standing>, MailboxError> {
        let (response, receiver) = oneshot::channel();
        self.sender
            .send(Message::Standings { response })
            .await
            .map_err(|_| MailboxError::Closed)?;
        receiver.await.map_err(|_| MailboxError::Canceled)
    }
}
