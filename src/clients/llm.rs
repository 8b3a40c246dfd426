// src/clients/llm.rs

//! Chat-completion client for OpenAI-compatible APIs.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, instrument, warn};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("Rate limit exceeded")]
    RateLimited,
    #[error("Authentication failed")]
    Authentication,
    #[error("Empty response from OpenAI")]
    EmptyResponse,
    #[error("Request timed out after {0} ms")]
    Timeout(u128),
}

/// A model that answers one system + user message pair with a single completion.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    /// Base URL without trailing slash, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct Choices {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Msg,
}

#[derive(Deserialize)]
struct Msg {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn request_body(&self, system: &str, user: &str) -> serde_json::Value {
        json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ]
        })
    }
}

#[async_trait]
impl ChatCompletion for OpenAiClient {
    #[instrument(skip(self, system, user), fields(model = %self.config.model))]
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        debug!("Calling chat completion, prompt length {} chars", user.len());

        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&self.request_body(system, user))
            .send()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(LlmError::Authentication);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited);
        }
        if !status.is_success() {
            let txt = resp
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!("Chat completion failed with status {}", status);
            return Err(LlmError::Api(format!("{}: {}", status, txt)));
        }

        let parsed: Choices = resp
            .json()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> OpenAiClient {
        OpenAiClient::new(OpenAiConfig {
            api_key: "sk-test".to_string(),
            base_url: base_url.to_string(),
            model: "gpt-test".to_string(),
            temperature: 0.7,
        })
    }

    #[test]
    fn test_endpoint_tolerates_trailing_slash() {
        assert_eq!(
            client("http://localhost:9/v1/").endpoint(),
            "http://localhost:9/v1/chat/completions"
        );
    }

    #[test]
    fn test_request_body_asks_for_json_object() {
        let body = client("http://x").request_body("sys", "usr");
        assert_eq!(body["model"], "gpt-test");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "usr");
    }
}
