//! Relay of addressed messages to a language model.
//!
//! Each user may ask one question per [Quota] period and all users share a
//! daily [TokenBudget] that refills at UTC midnight.

use crate::{completer::Completer, transport::Transport};
use duelbot_types::{ChatId, User, UserId};
use governor::{
    clock::{Clock, DefaultClock},
    DefaultKeyedRateLimiter, Quota, RateLimiter,
};
use std::{
    sync::{Arc, Mutex},
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tracing::{debug, error, info, warn};

pub const EMPTY_QUERY: &str = "Пожалуйста, введите вопрос после упоминания бота.";
pub const BUDGET_EXHAUSTED: &str = "Достигнут лимит использования токенов. Попробуйте позже.";
pub const APOLOGY: &str = "Извините, произошла ошибка при обработке вашего запроса.";

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

pub fn rate_limited(wait_secs: u64) -> String {
    format!("Пожалуйста, подождите {wait_secs}s перед следующим запросом.")
}

/// A question addressed to the bot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    pub chat: ChatId,
    pub user: User,
    /// Text with the bot mention stripped. May be empty.
    pub text: String,
}

/// Shared count of tokens spent since the last reset.
#[derive(Debug)]
pub struct TokenBudget {
    limit: u64,
    used: Mutex<u64>,
}

impl TokenBudget {
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            used: Mutex::new(0),
        }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn used(&self) -> u64 {
        *self.used.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn exhausted(&self) -> bool {
        self.used() >= self.limit
    }

    /// Add `tokens` to the running total.
    pub fn charge(&self, tokens: u64) {
        let mut used = self.used.lock().unwrap_or_else(|e| e.into_inner());
        *used = used.saturating_add(tokens);
    }

    pub fn reset(&self) {
        *self.used.lock().unwrap_or_else(|e| e.into_inner()) = 0;
    }
}

/// Time left until the next UTC midnight after `now`.
pub fn until_utc_midnight(now: SystemTime) -> Duration {
    let since_epoch = now.duration_since(UNIX_EPOCH).unwrap_or_default();
    let elapsed_today = Duration::new(
        since_epoch.as_secs() % SECONDS_PER_DAY,
        since_epoch.subsec_nanos(),
    );
    Duration::from_secs(SECONDS_PER_DAY).saturating_sub(elapsed_today)
}

/// Run [Assistant::reset] every UTC midnight. Never returns.
pub async fn reset_daily<C: Completer>(assistant: Arc<Assistant<C>>) {
    loop {
        let wait = until_utc_midnight(SystemTime::now());
        debug!(?wait, "next token budget reset");
        tokio::time::sleep(wait).await;
        assistant.reset();
    }
}

pub struct Assistant<C: Completer> {
    completer: C,
    limiter: DefaultKeyedRateLimiter<UserId>,
    clock: DefaultClock,
    budget: Arc<TokenBudget>,
}

impl<C: Completer> Assistant<C> {
    pub fn new(completer: C, quota: Quota, budget: Arc<TokenBudget>) -> Self {
        Self {
            completer,
            limiter: RateLimiter::keyed(quota),
            clock: DefaultClock::default(),
            budget,
        }
    }

    pub fn budget(&self) -> &Arc<TokenBudget> {
        &self.budget
    }

    /// Refill the budget and forget users whose interval has passed.
    pub fn reset(&self) {
        info!(
            used = self.budget.used(),
            tracked = self.limiter.len(),
            "resetting token budget"
        );
        self.budget.reset();
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    /// Answer `query`, posting every reply through `transport`.
    pub async fn handle<T: Transport>(&self, transport: &T, query: Query) {
        let Query { chat, user, text } = query;
        if text.is_empty() {
            send(transport, chat, EMPTY_QUERY).await;
            return;
        }

        if let Err(not_until) = self.limiter.check_key(&user.id) {
            let wait = not_until.wait_time_from(self.clock.now());
            let wait_secs = (wait.as_millis() as u64).div_ceil(1_000).max(1);
            debug!(user = %user.id, wait_secs, "assistant request rate limited");
            send(transport, chat, &rate_limited(wait_secs)).await;
            return;
        }

        if self.budget.exhausted() {
            info!(
                user = %user.id,
                limit = self.budget.limit(),
                "token budget exhausted"
            );
            send(transport, chat, BUDGET_EXHAUSTED).await;
            return;
        }

        if let Err(err) = transport.send_typing_indicator(chat).await {
            warn!(%chat, ?err, "failed to send typing indicator");
        }

        match self.completer.complete(&text).await {
            Ok(completion) => {
                self.budget.charge(completion.total_tokens);
                debug!(
                    user = %user.id,
                    tokens = completion.total_tokens,
                    used = self.budget.used(),
                    "assistant answered"
                );
                send(transport, chat, &completion.text).await;
            }
            Err(err) => {
                error!(user = %user.id, ?err, "completion failed");
                send(transport, chat, APOLOGY).await;
            }
        }
    }
}

async fn send<T: Transport>(transport: &T, chat: ChatId, text: &str) {
    if let Err(err) = transport.send_text(chat, text).await {
        warn!(%chat, ?err, "failed to send assistant reply");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        completer::Mock as MockCompleter,
        transport::{Mock as MockTransport, Sent},
    };

    const CHAT: ChatId = ChatId(5);

    fn create_assistant(
        completer: MockCompleter,
        interval: Duration,
        limit: u64,
    ) -> Assistant<MockCompleter> {
        let quota = Quota::with_period(interval).unwrap();
        Assistant::new(completer, quota, Arc::new(TokenBudget::new(limit)))
    }

    fn query(user: i64, text: &str) -> Query {
        Query {
            chat: CHAT,
            user: User::new(user, "asker"),
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_answer_with_typing_indicator() {
        let completer = MockCompleter::new();
        completer.reply("Привет!", 12);
        let assistant = create_assistant(completer.clone(), Duration::from_secs(60), 100);
        let transport = MockTransport::new();

        assistant.handle(&transport, query(1, "как дела?")).await;

        assert_eq!(
            transport.sent(),
            vec![
                Sent::Typing { chat: CHAT },
                Sent::Text {
                    chat: CHAT,
                    text: "Привет!".to_string()
                },
            ]
        );
        assert_eq!(completer.prompts(), vec!["как дела?".to_string()]);
        assert_eq!(assistant.budget().used(), 12);
    }

    #[tokio::test]
    async fn test_empty_query_prompts_for_question() {
        let completer = MockCompleter::new();
        let assistant = create_assistant(completer.clone(), Duration::from_secs(60), 100);
        let transport = MockTransport::new();

        assistant.handle(&transport, query(1, "")).await;
        assert_eq!(transport.texts(), vec![EMPTY_QUERY.to_string()]);
        assert!(completer.prompts().is_empty());

        // An empty query does not use up the user's request.
        assistant.handle(&transport, query(1, "вопрос")).await;
        assert_eq!(completer.prompts(), vec!["вопрос".to_string()]);
    }

    #[tokio::test]
    async fn test_second_request_in_interval_refused() {
        let completer = MockCompleter::new();
        let assistant = create_assistant(completer.clone(), Duration::from_secs(60), 100);
        let transport = MockTransport::new();

        assistant.handle(&transport, query(1, "first")).await;
        assistant.handle(&transport, query(1, "second")).await;
        assistant.handle(&transport, query(2, "other user")).await;

        assert_eq!(
            completer.prompts(),
            vec!["first".to_string(), "other user".to_string()]
        );
        let texts = transport.texts();
        assert_eq!(texts.len(), 3);
        assert!(texts[1].starts_with("Пожалуйста, подождите "));
        assert!(texts[1].ends_with("s перед следующим запросом."));
    }

    #[tokio::test]
    async fn test_exhausted_budget_refuses_until_reset() {
        let completer = MockCompleter::new();
        completer.reply("long answer", 50);
        let assistant = create_assistant(completer.clone(), Duration::from_millis(1), 50);
        let transport = MockTransport::new();

        assistant.handle(&transport, query(1, "one")).await;
        assert!(assistant.budget().exhausted());

        assistant.handle(&transport, query(2, "two")).await;
        assert_eq!(transport.texts().last().unwrap(), BUDGET_EXHAUSTED);
        assert_eq!(completer.prompts().len(), 1);

        assistant.budget().reset();
        assistant.handle(&transport, query(3, "three")).await;
        assert_eq!(completer.prompts().len(), 2);
        assert_eq!(transport.texts().last().unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_model_failure_yields_apology() {
        let completer = MockCompleter::new();
        completer.fail("quota exceeded");
        let assistant = create_assistant(completer, Duration::from_secs(60), 100);
        let transport = MockTransport::new();

        assistant.handle(&transport, query(1, "hello")).await;

        let texts = transport.texts();
        assert_eq!(texts, vec![APOLOGY.to_string()]);
        assert_eq!(assistant.budget().used(), 0);
    }

    #[tokio::test]
    async fn test_send_failures_are_swallowed() {
        let completer = MockCompleter::new();
        let assistant = create_assistant(completer.clone(), Duration::from_secs(60), 100);
        let transport = MockTransport::new();
        transport.fail(true);

        assistant.handle(&transport, query(1, "hello")).await;
        assert_eq!(completer.prompts().len(), 1);
        assert_eq!(transport.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_reset_refills_budget_and_prunes_idle_users() {
        let completer = MockCompleter::new();
        completer.reply("answer", 50);
        let assistant = create_assistant(completer.clone(), Duration::from_millis(1), 100);
        let transport = MockTransport::new();

        assistant.handle(&transport, query(1, "one")).await;
        assistant.handle(&transport, query(2, "two")).await;
        assert_eq!(assistant.limiter.len(), 2);
        assert!(assistant.budget().exhausted());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assistant.reset();
        assert!(assistant.limiter.is_empty());
        assert_eq!(assistant.budget().used(), 0);

        assistant.handle(&transport, query(1, "again")).await;
        assert_eq!(completer.prompts().len(), 3);
    }

    #[tokio::test]
    async fn test_reset_keeps_users_inside_interval() {
        let completer = MockCompleter::new();
        let assistant = create_assistant(completer.clone(), Duration::from_secs(60), 100);
        let transport = MockTransport::new();

        assistant.handle(&transport, query(1, "one")).await;
        assistant.reset();
        assert_eq!(assistant.limiter.len(), 1);

        assistant.handle(&transport, query(1, "two")).await;
        assert_eq!(completer.prompts(), vec!["one".to_string()]);
    }

    #[test]
    fn test_until_utc_midnight() {
        let day = Duration::from_secs(SECONDS_PER_DAY);
        assert_eq!(until_utc_midnight(UNIX_EPOCH), day);

        let evening = UNIX_EPOCH + Duration::from_secs(3 * SECONDS_PER_DAY + 23 * 3600);
        assert_eq!(until_utc_midnight(evening), Duration::from_secs(3600));

        let almost = UNIX_EPOCH + day - Duration::from_millis(250);
        assert_eq!(until_utc_midnight(almost), Duration::from_millis(250));
    }

    #[test]
    fn test_budget_charges_and_resets() {
        let budget = TokenBudget::new(10);
        assert!(!budget.exhausted());
        budget.charge(4);
        budget.charge(6);
        assert!(budget.exhausted());
        assert_eq!(budget.used(), 10);
        budget.reset();
        assert_eq!(budget.used(), 0);
    }
}
