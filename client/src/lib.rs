pub mod client;
pub mod completions;
pub mod telegram;
pub mod updates;

pub use client::Client;
pub use client::RetryPolicy;
pub use completions::{ChatCompletion, Completions};
pub use telegram::{InlineButton, Telegram};
pub use updates::Stream;
use thiserror::Error;

/// Error type for client operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("failed: {0}")]
    Failed(reqwest::StatusCode),
    #[error("api error {code}: {description}")]
    Api { code: i64, description: String },
    #[error("rate limited by the completion API")]
    RateLimited,
    #[error("unauthorized: check the API key")]
    Unauthorized,
    #[error("completion contained no text")]
    EmptyCompletion,
    #[error("invalid data: {0}")]
    InvalidData(#[from] serde_json::Error),
    #[error("connection closed")]
    ConnectionClosed,
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid URL scheme: {0} (expected http or https)")]
    InvalidScheme(String),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Query, State},
        http::{HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use duelbot_types::{ChatId, Inbound, MessageId, User};
    use serde_json::{json, Value};
    use std::{
        collections::{HashMap, VecDeque},
        net::SocketAddr,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Mutex,
        },
    };
    use tokio::time::{sleep, timeout, Duration};

    const TOKEN: &str = "123-abc";
    const API_KEY: &str = "sk-test";

    #[derive(Default)]
    struct MockApi {
        /// (method, body) of every POST.
        requests: Mutex<Vec<(String, Value)>>,
        /// Batches served by successive `getUpdates` calls.
        updates: Mutex<VecDeque<Value>>,
        offsets: Mutex<Vec<Option<String>>>,
        /// Number of `getMe` calls that fail before one succeeds.
        get_me_failures: AtomicUsize,
        authorization: Mutex<Vec<String>>,
    }

    impl MockApi {
        fn record(&self, method: &str, body: Value) {
            self.requests
                .lock()
                .unwrap()
                .push((method.to_string(), body));
        }
    }

    struct TestContext {
        api: Arc<MockApi>,
        base_url: String,
        server_handle: tokio::task::JoinHandle<()>,
    }

    async fn get_me(State(api): State<Arc<MockApi>>) -> (StatusCode, String) {
        let remaining = api.get_me_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            api.get_me_failures.store(remaining - 1, Ordering::SeqCst);
            return (StatusCode::SERVICE_UNAVAILABLE, "unavailable".to_string());
        }
        let body = json!({
            "ok": true,
            "result": {"id": 999, "is_bot": true, "first_name": "Duel", "username": "duel_bot"}
        });
        (StatusCode::OK, body.to_string())
    }

    async fn get_updates(
        State(api): State<Arc<MockApi>>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Json<Value> {
        api.offsets
            .lock()
            .unwrap()
            .push(params.get("offset").cloned());
        let batch = api.updates.lock().unwrap().pop_front();
        match batch {
            Some(batch) => Json(json!({"ok": true, "result": batch})),
            None => {
                sleep(Duration::from_millis(50)).await;
                Json(json!({"ok": true, "result": []}))
            }
        }
    }

    async fn send_message(State(api): State<Arc<MockApi>>, Json(body): Json<Value>) -> Json<Value> {
        api.record("sendMessage", body);
        Json(json!({"ok": true, "result": {"message_id": 77, "chat": {"id": -100}}}))
    }

    async fn send_chat_action(
        State(api): State<Arc<MockApi>>,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        api.record("sendChatAction", body);
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"ok": false, "error_code": 400, "description": "Bad Request: chat not found"})),
        )
    }

    async fn answer_callback_query(
        State(api): State<Arc<MockApi>>,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        api.record("answerCallbackQuery", body);
        Json(json!({"ok": true, "result": true}))
    }

    async fn completions(
        State(api): State<Arc<MockApi>>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        if let Some(value) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
            api.authorization.lock().unwrap().push(value.to_string());
        }
        let prompt = body["messages"][0]["content"].as_str().unwrap_or_default();
        api.record("completions", body.clone());
        match prompt {
            "busy" => (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({"error": {"message": "Rate limit reached"}})),
            ),
            "locked" => (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": {"message": "Incorrect API key"}})),
            ),
            "broken" => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": {"message": "The server had an error"}})),
            ),
            "silent" => (
                StatusCode::OK,
                Json(json!({"choices": [{"message": {"content": "  "}}], "usage": {"total_tokens": 3}})),
            ),
            _ => (
                StatusCode::OK,
                Json(json!({
                    "choices": [{"message": {"role": "assistant", "content": " Привет! "}}],
                    "usage": {"prompt_tokens": 9, "completion_tokens": 3, "total_tokens": 12}
                })),
            ),
        }
    }

    impl TestContext {
        async fn new() -> Self {
            let api = Arc::new(MockApi::default());
            let bot = format!("/bot{TOKEN}");
            let router = Router::new()
                .route(&format!("{bot}/getMe"), get(get_me))
                .route(&format!("{bot}/getUpdates"), get(get_updates))
                .route(&format!("{bot}/sendMessage"), post(send_message))
                .route(&format!("{bot}/sendChatAction"), post(send_chat_action))
                .route(
                    &format!("{bot}/answerCallbackQuery"),
                    post(answer_callback_query),
                )
                .route("/v1/chat/completions", post(completions))
                .with_state(api.clone());

            // Start server on random port
            let addr = SocketAddr::from(([127, 0, 0, 1], 0));
            let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
            let actual_addr = listener.local_addr().unwrap();
            let base_url = format!("http://{actual_addr}/");

            let server_handle = tokio::spawn(async move {
                axum::serve(listener, router).await.unwrap();
            });

            Self {
                api,
                base_url,
                server_handle,
            }
        }

        fn telegram(&self) -> Telegram {
            Telegram::new(&self.base_url, TOKEN).unwrap()
        }

        fn completions(&self) -> Completions {
            Completions::new(&self.base_url, API_KEY).unwrap()
        }

        fn requests(&self, method: &str) -> Vec<Value> {
            self.api
                .requests
                .lock()
                .unwrap()
                .iter()
                .filter(|(m, _)| m == method)
                .map(|(_, body)| body.clone())
                .collect()
        }
    }

    impl Drop for TestContext {
        fn drop(&mut self) {
            self.server_handle.abort();
        }
    }

    #[tokio::test]
    async fn test_get_me() {
        let ctx = TestContext::new().await;
        let me = ctx.telegram().get_me().await.unwrap();
        assert_eq!(me, User::new(999, "duel_bot"));
    }

    #[tokio::test]
    async fn test_get_me_retries_when_configured() {
        let ctx = TestContext::new().await;
        ctx.api.get_me_failures.store(2, Ordering::SeqCst);

        // Default policy: one attempt.
        let result = ctx.telegram().get_me().await;
        assert!(matches!(
            result,
            Err(Error::Failed(status)) if status == reqwest::StatusCode::SERVICE_UNAVAILABLE
        ));

        let telegram = ctx.telegram().with_retry_policy(RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            retry_non_idempotent: false,
        });
        assert_eq!(telegram.get_me().await.unwrap().handle, "duel_bot");
    }

    #[tokio::test]
    async fn test_send_message_with_buttons() {
        let ctx = TestContext::new().await;
        let telegram = ctx.telegram();

        let id = telegram
            .send_message(
                ChatId(-100),
                "вызов",
                &[
                    InlineButton::new("Принять", "accept_duel|1|55"),
                    InlineButton::new("Отказаться", "reject_duel|1"),
                ],
            )
            .await
            .unwrap();
        assert_eq!(id, MessageId(77));

        telegram
            .send_message(ChatId(-100), "просто текст", &[])
            .await
            .unwrap();

        let sent = ctx.requests("sendMessage");
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0]["chat_id"], json!(-100));
        assert_eq!(sent[0]["text"], json!("вызов"));
        assert_eq!(
            sent[0]["reply_markup"]["inline_keyboard"][0][1]["callback_data"],
            json!("reject_duel|1")
        );
        assert!(sent[1].get("reply_markup").is_none());
    }

    #[tokio::test]
    async fn test_bot_api_error_surfaces() {
        let ctx = TestContext::new().await;
        let result = ctx.telegram().send_typing(ChatId(-1)).await;
        match result {
            Err(Error::Api { code, description }) => {
                assert_eq!(code, 400);
                assert_eq!(description, "Bad Request: chat not found");
            }
            other => panic!("Expected api error, got {other:?}"),
        }
        assert_eq!(ctx.requests("sendChatAction")[0]["action"], json!("typing"));
    }

    #[tokio::test]
    async fn test_answer_callback_query() {
        let ctx = TestContext::new().await;
        ctx.telegram().answer_callback_query("cb-1").await.unwrap();
        assert_eq!(
            ctx.requests("answerCallbackQuery")[0]["callback_query_id"],
            json!("cb-1")
        );
    }

    #[tokio::test]
    async fn test_updates_stream() {
        let ctx = TestContext::new().await;
        ctx.api.updates.lock().unwrap().push_back(json!([
            {
                "update_id": 10,
                "message": {
                    "message_id": 55,
                    "chat": {"id": -100},
                    "from": {"id": 1, "first_name": "Alice", "username": "alice"},
                    "text": "/stats",
                    "entities": [{"type": "bot_command", "offset": 0, "length": 6}]
                }
            },
            {
                "update_id": 11,
                "edited_message": {"message_id": 1, "chat": {"id": -100}}
            },
            {
                "update_id": 12,
                "callback_query": {
                    "id": "cb-1",
                    "from": {"id": 2, "first_name": "Bob"},
                    "message": {"message_id": 56, "chat": {"id": -100}},
                    "data": "shoot|55"
                }
            }
        ]));

        let mut stream = ctx.telegram().connect_updates(Duration::from_secs(0));

        let first = timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("Timed out waiting for update")
            .expect("Stream closed")
            .unwrap();
        match first {
            Inbound::Message(message) => {
                assert_eq!(message.command(), Some(("stats", None)));
                assert_eq!(message.sender, User::new(1, "alice"));
            }
            other => panic!("Expected message, got {other:?}"),
        }

        let second = timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("Timed out waiting for update")
            .expect("Stream closed")
            .unwrap();
        match second {
            Inbound::Callback(callback) => {
                assert_eq!(callback.data, "shoot|55");
                assert_eq!(callback.sender.handle, "Bob");
            }
            other => panic!("Expected callback, got {other:?}"),
        }

        // The next poll acknowledges everything seen so far.
        for _ in 0..100 {
            if ctx.api.offsets.lock().unwrap().len() >= 2 {
                break;
            }
            sleep(Duration::from_millis(20)).await;
        }
        let offsets = ctx.api.offsets.lock().unwrap().clone();
        assert_eq!(offsets[0], None);
        assert_eq!(offsets[1], Some("13".to_string()));
    }

    #[tokio::test]
    async fn test_completion_success() {
        let ctx = TestContext::new().await;
        let completion = ctx
            .completions()
            .with_model("gpt-test", 42)
            .complete("Как дела?")
            .await
            .unwrap();
        assert_eq!(
            completion,
            ChatCompletion {
                text: "Привет!".to_string(),
                total_tokens: 12,
            }
        );

        let request = &ctx.requests("completions")[0];
        assert_eq!(request["model"], json!("gpt-test"));
        assert_eq!(request["max_tokens"], json!(42));
        assert_eq!(request["messages"][0]["role"], json!("user"));
        assert_eq!(
            ctx.api.authorization.lock().unwrap()[0],
            format!("Bearer {API_KEY}")
        );
    }

    #[tokio::test]
    async fn test_completion_errors() {
        let ctx = TestContext::new().await;
        let completions = ctx.completions();

        assert!(matches!(
            completions.complete("busy").await,
            Err(Error::RateLimited)
        ));
        assert!(matches!(
            completions.complete("locked").await,
            Err(Error::Unauthorized)
        ));
        match completions.complete("broken").await {
            Err(Error::Api { code, description }) => {
                assert_eq!(code, 500);
                assert_eq!(description, "The server had an error");
            }
            other => panic!("Expected api error, got {other:?}"),
        }
        assert!(matches!(
            completions.complete("silent").await,
            Err(Error::EmptyCompletion)
        ));
        // Completions are never retried.
        assert_eq!(ctx.requests("completions").len(), 4);
    }
}
