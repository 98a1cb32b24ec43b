use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{GenerationError, Generator};
use crate::config::GenerationConfig;

/// Local Ollama server, non-streaming `/api/generate`.
pub struct OllamaGenerator {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaGenerator {
    /// The HTTP client gets no timeout of its own: the per-call bound is
    /// applied by `TimeoutGenerator` so it is the same for every backend.
    pub fn new(base_url: &str, model: &str) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| GenerationError::Http(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
        })
    }

    pub fn from_config(config: &GenerationConfig) -> Result<Self, GenerationError> {
        Self::new(&config.base_url, &config.model)
    }
}

#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    format: &'a str,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn generate(&self, prompt: &str, context: &str) -> Result<String, GenerationError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt: context,
            system: prompt,
            stream: false,
            format: "json",
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    GenerationError::Connection(self.base_url.clone())
                } else {
                    GenerationError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        Ok(parsed.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let g = OllamaGenerator::new("http://localhost:11434/", "llama3.1:8b").unwrap();
        assert_eq!(g.base_url, "http://localhost:11434");
        assert_eq!(g.model, "llama3.1:8b");
    }

    #[test]
    fn request_puts_instructions_in_system() {
        let req = OllamaGenerateRequest {
            model: "m",
            prompt: "DOCUMENTS...",
            system: "ROLE: minutes_analyzer",
            stream: false,
            format: "json",
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["system"], "ROLE: minutes_analyzer");
        assert_eq!(json["prompt"], "DOCUMENTS...");
        assert_eq!(json["stream"], false);
    }

    #[tokio::test]
    async fn unreachable_server_is_connection_error() {
        // Port 9 (discard) is essentially never listening locally.
        let g = OllamaGenerator::new("http://127.0.0.1:9", "m").unwrap();
        let err = g.generate("p", "c").await.unwrap_err();
        assert!(matches!(err, GenerationError::Connection(_) | GenerationError::Http(_)));
    }
}
