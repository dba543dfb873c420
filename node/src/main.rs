use anyhow::Context;
use clap::Parser;
use duelbot_client::{Completions, Telegram};
use duelbot_execution::GameRng;
use duelbot_node::{
    engine::{self, Engine},
    Config,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration file (defaults are used when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load config
    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("could not read config file {}", path.display()))?;
            serde_yaml::from_str::<Config>(&raw).context("could not parse config file")?
        }
        None => Config::default(),
    };
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    let config = config
        .validate(|name| std::env::var(name).ok())
        .context("invalid configuration")?;

    // Initialize logging
    if config.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(config.log_level)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(config.log_level)
            .init();
    }

    // Connect collaborators
    let telegram = Telegram::new(config.telegram_api_url.as_str(), config.telegram_token)
        .context("failed to create transport client")?
        .with_retry_policy(config.retry_policy);
    let completions = Completions::new(config.completion_api_url.as_str(), config.completion_key)
        .context("failed to create completion client")?
        .with_model(config.model, config.max_tokens);
    let bot = telegram
        .get_me()
        .await
        .context("failed to fetch bot identity")?;
    info!(id = %bot.id, handle = %bot.handle, "authorized");

    // Start engine
    let engine = Engine::new(engine::Config {
        transport: telegram.clone(),
        completer: completions,
        bot,
        rng: GameRng::from_entropy(),
        mailbox_size: config.mailbox_size,
        duel_keyword: config.duel_keyword,
        roulette_keyword: config.roulette_keyword,
        request_quota: config.request_quota,
        daily_token_limit: config.daily_token_limit,
    });
    let mailbox = engine.mailbox();
    let handle = engine.start();

    // Relay updates until interrupted
    let updates = telegram.connect_updates_with_capacity(config.poll_timeout, config.mailbox_size);
    tokio::select! {
        _ = engine::relay(updates, mailbox) => {},
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for shutdown signal")?;
            info!("shutdown requested");
        },
    }

    // The relay held the last mailbox, so the dispatcher drains and exits
    handle.await.context("engine task failed")?;
    Ok(())
}
