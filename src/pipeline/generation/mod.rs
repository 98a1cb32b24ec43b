//! The opaque text-generation capability agents call.

pub mod ollama;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use ollama::OllamaGenerator;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Generation backend not reachable at {0}")]
    Connection(String),

    #[error("Generation backend returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Generation timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("Malformed generation response: {0}")]
    MalformedResponse(String),
}

/// `generate(prompt, context) -> text`.
///
/// `prompt` carries the agent's instructions, `context` the document text
/// it is allowed to see. Implementations must not retain either.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str, context: &str) -> Result<String, GenerationError>;
}

/// Bounds every call of the wrapped generator.
///
/// On expiry the inner future is dropped; whatever it would have returned
/// is never seen by the caller.
pub struct TimeoutGenerator<G> {
    inner: G,
    timeout: Duration,
}

impl<G: Generator> TimeoutGenerator<G> {
    pub fn new(inner: G, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<G: Generator> Generator for TimeoutGenerator<G> {
    async fn generate(&self, prompt: &str, context: &str) -> Result<String, GenerationError> {
        match tokio::time::timeout(self.timeout, self.inner.generate(prompt, context)).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout {
                secs: self.timeout.as_secs(),
            }),
        }
    }
}

#[async_trait]
impl<G: Generator + ?Sized> Generator for std::sync::Arc<G> {
    async fn generate(&self, prompt: &str, context: &str) -> Result<String, GenerationError> {
        (**self).generate(prompt, context).await
    }
}

/// Strip reasoning blocks and surrounding chatter from model output.
pub fn clean_response(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(end) = text.rfind("</think>") {
        text = text[end + "</think>".len()..].trim();
    }
    text
}
