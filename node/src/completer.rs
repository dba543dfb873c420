use duelbot_client::Completions;
use std::future::Future;
#[cfg(test)]
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

/// Model reply together with the tokens it cost.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub total_tokens: u64,
}

/// Trait for interacting with a language model.
pub trait Completer: Clone + Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Answer a single user prompt.
    fn complete(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<Completion, Self::Error>> + Send;
}

impl Completer for Completions {
    type Error = duelbot_client::Error;

    async fn complete(&self, prompt: &str) -> Result<Completion, Self::Error> {
        let reply = Completions::complete(self, prompt).await?;
        Ok(Completion {
            text: reply.text,
            total_tokens: reply.total_tokens,
        })
    }
}

/// A mock completer that replays scripted replies.
///
/// Once the script runs out every prompt is answered with `"ok"` at a cost
/// of one token.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct Mock {
    pub prompts: Arc<Mutex<Vec<String>>>,
    pub script: Arc<Mutex<VecDeque<Result<Completion, String>>>>,
}

#[cfg(test)]
impl Mock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, text: &str, total_tokens: u64) {
        self.script.lock().unwrap().push_back(Ok(Completion {
            text: text.to_string(),
            total_tokens,
        }));
    }

    pub fn fail(&self, reason: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(reason.to_string()));
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Completer for Mock {
    type Error = std::io::Error;

    async fn complete(&self, prompt: &str) -> Result<Completion, Self::Error> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(completion)) => Ok(completion),
            Some(Err(reason)) => Err(std::io::Error::other(reason)),
            None => Ok(Completion {
                text: "ok".to_string(),
                total_tokens: 1,
            }),
        }
    }
}
