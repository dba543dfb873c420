//! OpenAI-compatible chat completion client.

use crate::{Client, Error, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default root of the completion API.
pub const DEFAULT_API_URL: &str = "https://api.openai.com/";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_MAX_TOKENS: u32 = 150;

const COMPLETIONS_PATH: &str = "v1/chat/completions";

#[derive(Clone, Debug)]
pub struct Completions {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
}

/// Model reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatCompletion {
    pub text: String,
    /// Prompt plus completion tokens charged for the call.
    pub total_tokens: u64,
}

impl Completions {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: Client::new(base_url)?,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>, max_tokens: u32) -> Self {
        self.model = model.into();
        self.max_tokens = max_tokens;
        self
    }

    /// Send `prompt` as a single user message. Never retried.
    pub async fn complete(&self, prompt: &str) -> Result<ChatCompletion> {
        let url = self.client.join(COMPLETIONS_PATH)?;
        let request = Request {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: [RequestMessage {
                role: "user",
                content: prompt,
            }],
        };
        let response = self
            .client
            .post_json_with_retry(url, &request, Some(&self.api_key))
            .await?;

        let status = response.status();
        match status {
            StatusCode::TOO_MANY_REQUESTS => return Err(Error::RateLimited),
            StatusCode::UNAUTHORIZED => return Err(Error::Unauthorized),
            status if !status.is_success() => {
                let description = response
                    .json::<ErrorBody>()
                    .await
                    .map(|body| body.error.message)
                    .unwrap_or_default();
                return Err(Error::Api {
                    code: i64::from(status.as_u16()),
                    description,
                });
            }
            _ => {}
        }

        let body: Response = response.json().await?;
        let total_tokens = body.usage.map(|usage| usage.total_tokens).unwrap_or(0);
        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(Error::EmptyCompletion)?;
        debug!(total_tokens, "completion received");
        Ok(ChatCompletion { text, total_tokens })
    }
}

#[derive(Serialize)]
struct Request<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [RequestMessage<'a>; 1],
}

#[derive(Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: u64,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}
