use crate::{
    assistant::{reset_daily, Assistant, TokenBudget},
    completer::Completer,
    dispatcher::{self, Mailbox},
    router::Router,
    transport::Transport,
};
use duelbot_execution::{GameRng, IdentityDirectory, Layer, Leaderboard, SessionRegistry};
use duelbot_types::{Inbound, User};
use futures::{Stream, StreamExt};
use governor::Quota;
use std::{fmt::Debug, sync::Arc};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Configuration for the [Engine].
pub struct Config<T: Transport, C: Completer> {
    pub transport: T,
    pub completer: C,

    /// The bot's own identity, as reported by the transport.
    pub bot: User,
    pub rng: GameRng,
    pub mailbox_size: usize,

    pub duel_keyword: String,
    pub roulette_keyword: String,

    pub request_quota: Quota,
    pub daily_token_limit: u64,
}

/// Wires the stores, router and assistant into a running dispatcher.
pub struct Engine<T: Transport, C: Completer> {
    dispatcher: dispatcher::Actor<T, C>,
    dispatcher_mailbox: Mailbox,
    assistant: Arc<Assistant<C>>,
}

impl<T: Transport, C: Completer> Engine<T, C> {
    pub fn new(config: Config<T, C>) -> Self {
        // The bot must resolve so challenges naming it can be refused
        let mut directory = IdentityDirectory::new();
        directory.observe_user(&config.bot);
        let layer = Layer::new(
            config.bot.id,
            directory,
            Leaderboard::new(),
            SessionRegistry::new(),
            config.rng,
        );
        let router = Router::new(
            config.bot,
            &config.duel_keyword,
            &config.roulette_keyword,
        );

        let budget = Arc::new(TokenBudget::new(config.daily_token_limit));
        let assistant = Arc::new(Assistant::new(
            config.completer,
            config.request_quota,
            budget,
        ));

        let (dispatcher, dispatcher_mailbox) = dispatcher::Actor::new(dispatcher::Config {
            transport: config.transport,
            layer,
            router,
            assistant: assistant.clone(),
            mailbox_size: config.mailbox_size,
        });

        Self {
            dispatcher,
            dispatcher_mailbox,
            assistant,
        }
    }

    pub fn mailbox(&self) -> Mailbox {
        self.dispatcher_mailbox.clone()
    }

    /// Run until every [Mailbox] has been dropped and the queue is drained.
    pub fn start(self) -> JoinHandle<()> {
        let Self {
            dispatcher,
            assistant,
            ..
        } = self;
        let dispatcher = dispatcher.start();
        tokio::spawn(async move {
            let reset = tokio::spawn(reset_daily(assistant));
            if let Err(err) = dispatcher.await {
                error!(?err, "dispatcher failed");
            }
            reset.abort();
            info!("engine stopped");
        })
    }
}

/// Forward `updates` into `mailbox` until either side closes.
///
/// Poll errors are logged and skipped.
pub async fn relay<S, E>(mut updates: S, mut mailbox: Mailbox)
where
    S: Stream<Item = Result<Inbound, E>> + Unpin,
    E: Debug,
{
    while let Some(update) = updates.next().await {
        let inbound = match update {
            Ok(inbound) => inbound,
            Err(err) => {
                warn!(?err, "skipping failed update");
                continue;
            }
        };
        if let Err(err) = mailbox.deliver(inbound).await {
            warn!(?err, "dispatcher unavailable, stopping relay");
            return;
        }
    }
    info!("update stream ended");
}
