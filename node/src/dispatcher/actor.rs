use crate::{
    assistant::Assistant,
    completer::Completer,
    dispatcher::{ingress::Mailbox, Config, Message},
    router::{Route, Router},
    transport::{self, Transport},
};
use duelbot_execution::Layer;
use duelbot_types::{Inbound, InboundMessage};
use futures::{channel::mpsc, StreamExt};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct Actor<T: Transport, C: Completer> {
    transport: T,
    layer: Layer,
    router: Router,
    assistant: Arc<Assistant<C>>,
    mailbox: mpsc::Receiver<Message>,
}

impl<T: Transport, C: Completer> Actor<T, C> {
    pub fn new(config: Config<T, C>) -> (Self, Mailbox) {
        let (sender, mailbox) = mpsc::channel(config.mailbox_size);
        (
            Self {
                transport: config.transport,
                layer: config.layer,
                router: config.router,
                assistant: config.assistant,
                mailbox,
            },
            Mailbox::new(sender),
        )
    }

    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        info!(bot = %self.router.bot().handle, "dispatcher started");
        while let Some(message) = self.mailbox.next().await {
            match message {
                Message::Deliver(inbound) => self.process(inbound).await,
                Message::Standings { response } => {
                    let _ = response.send(self.layer.standings());
                }
            }
        }
        info!(
            pending = self.layer.registry().pending_challenges(),
            live = self.layer.registry().live_sessions(),
            "mailbox closed, dispatcher stopped"
        );
    }

    async fn process(&mut self, inbound: Inbound) {
        self.observe(&inbound);

        match self.router.route(&inbound) {
            Route::Game(intent) => {
                for notification in self.layer.execute(intent) {
                    transport::deliver(&self.transport, &notification).await;
                }
            }
            Route::Assistant(query) => {
                debug!(chat = %query.chat, user = %query.user.id, "relaying to assistant");
                let assistant = self.assistant.clone();
                let transport = self.transport.clone();
                tokio::spawn(async move {
                    assistant.handle(&transport, query).await;
                });
            }
            Route::Ignore => {}
        }

        if let Inbound::Callback(callback) = &inbound {
            if let Err(err) = self.transport.acknowledge(&callback.id).await {
                warn!(callback = %callback.id, ?err, "failed to acknowledge action");
            }
        }
    }

    /// Record every user the event reveals.
    fn observe(&mut self, inbound: &Inbound) {
        self.layer.observe(inbound.sender());
        if let Inbound::Message(InboundMessage {
            reply_to,
            annotations,
            ..
        }) = inbound
        {
            for user in reply_to.iter().chain(annotations.iter().filter_map(|a| a.user.as_ref())) {
                self.layer.observe(user);
            }
        }
    }
}
