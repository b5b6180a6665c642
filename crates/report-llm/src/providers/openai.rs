//! OpenAI-compatible provider implementation
//!
//! Talks to any server exposing the `/chat/completions` endpoint, which covers
//! LM Studio, llama.cpp, vLLM and Ollama's own compatibility layer.
//!
//! # Examples
//!
//! ```no_run
//! use report_llm::LLMProvider;
//! use report_llm::providers::{OpenAIConfig, OpenAIProvider};
//!
//! # async fn example() -> report_llm::Result<()> {
//! let config = OpenAIConfig::new("local-model")
//!     .with_api_base("http://localhost:1234/v1")
//!     .with_timeout(60);
//!
//! let provider = OpenAIProvider::with_config(config)?;
//! let answer = provider.generate("Summarise AAPL in one sentence.").await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

use crate::{LLMError, LLMProvider, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_API_BASE: &str = "http://localhost:1234/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_TOKENS: usize = 512;

/// Configuration for the OpenAI-compatible provider
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Model identifier sent with every request
    pub model: String,

    /// API key; local servers usually accept anything
    pub api_key: Option<String>,

    /// Base URL (default: "http://localhost:1234/v1")
    pub api_base: String,

    /// Request timeout in seconds (default: 120)
    pub timeout_secs: u64,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Sampling temperature
    pub temperature: Option<f32>,
}

impl OpenAIConfig {
    /// Create a config for `model` with default settings
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: Some(0.7),
        }
    }

    /// Set custom API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set the API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

/// OpenAI-compatible provider
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    /// Create a new provider with custom configuration
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        if config.api_base.trim().is_empty() {
            return Err(LLMError::ConfigurationError(
                "api_base must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip(self, prompt), fields(model = %self.config.model, api_base = %self.config.api_base))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let mut builder = self.client.post(self.config.endpoint()).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_connect() {
                LLMError::Unavailable(format!("cannot reach {}: {e}", self.config.api_base))
            } else {
                LLMError::HttpError(e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(LLMError::RequestFailed(format!("HTTP {status}: {error_text}")));
        }

        let raw = response.text().await?;
        let body = parse_response(&raw)?;

        debug!("Received {} choice(s)", body.choices.len());
        extract_text(body)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

fn parse_response(raw: &str) -> Result<ChatResponse> {
    Ok(serde_json::from_str(raw)?)
}

fn extract_text(body: ChatResponse) -> Result<String> {
    let choice = body
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LLMError::UnexpectedResponse("No choices in response".to_string()))?;

    choice
        .message
        .content
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| LLMError::UnexpectedResponse("Empty message content".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_builder() {
        let config = OpenAIConfig::new("qwen2.5")
            .with_api_base("http://localhost:8000/v1/")
            .with_api_key("not-needed")
            .with_timeout(30)
            .with_max_tokens(256);

        assert_eq!(config.endpoint(), "http://localhost:8000/v1/chat/completions");
        assert_eq!(config.api_key.as_deref(), Some("not-needed"));
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_tokens, 256);
    }

    #[test]
    fn test_empty_api_base_rejected() {
        let result = OpenAIProvider::with_config(OpenAIConfig::new("m").with_api_base("  "));
        assert!(matches!(result, Err(LLMError::ConfigurationError(_))));
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: "m",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            max_tokens: 10,
            temperature: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "model": "m",
                "messages": [{"role": "user", "content": "hi"}],
                "max_tokens": 10
            })
        );
    }

    #[test]
    fn test_malformed_response_is_serialization_error() {
        let err = parse_response("<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, LLMError::SerializationError(_)));
        assert!(err.to_string().starts_with("Serialization error:"));

        let body = parse_response(r#"{"choices": [{"message": {"content": "Buy."}}]}"#).unwrap();
        assert_eq!(extract_text(body).unwrap(), "Buy.");
    }

    #[test]
    fn test_extract_text() {
        let body: ChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "  Hold.  "}}]
        }))
        .unwrap();
        assert_eq!(extract_text(body).unwrap(), "Hold.");

        let empty: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(
            extract_text(empty),
            Err(LLMError::UnexpectedResponse(_))
        ));
    }
}
