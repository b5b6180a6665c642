//! Configuration for stock report operations

use crate::error::{Result, StockError};
use report_llm::LanguageModel;
use report_llm::providers::{OllamaConfig, OllamaProvider, OpenAIConfig, OpenAIProvider};
use report_utils::{ProcessEnv, VarSource, parse_var, string_var};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Backend used for the optional AI section of the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Local `ollama` binary driven over stdin/stdout (default)
    #[default]
    Ollama,
    /// Any OpenAI-compatible HTTP endpoint (LM Studio, llama.cpp, vLLM)
    OpenAI,
    /// No AI section
    Disabled,
}

impl FromStr for LlmBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            "disabled" | "off" | "none" => Ok(Self::Disabled),
            other => Err(format!(
                "unknown backend '{other}' (expected ollama, openai or disabled)"
            )),
        }
    }
}

/// Configuration for stock report operations
///
/// `Debug` output masks the API keys.
#[derive(Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Upper bound for one market-data request
    pub request_timeout: Duration,

    /// Upper bound for one language-model generation
    pub llm_timeout: Duration,

    /// Language-model backend
    pub llm_backend: LlmBackend,

    /// Model name passed to the backend
    pub llm_model: String,

    /// Binary used by the Ollama backend
    pub ollama_command: String,

    /// Base URL used by the OpenAI-compatible backend
    pub llm_api_base: String,

    /// API key for the OpenAI-compatible backend (optional)
    pub llm_api_key: Option<String>,

    /// Alpha Vantage API key; without it fundamentals are unavailable
    pub alpha_vantage_api_key: Option<String>,

    /// Alpha Vantage requests per minute
    pub alpha_vantage_rate_limit: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            llm_timeout: Duration::from_secs(120),
            llm_backend: LlmBackend::Ollama,
            llm_model: "EntropyYue/chatglm3".to_string(),
            ollama_command: "ollama".to_string(),
            llm_api_base: "http://localhost:1234/v1".to_string(),
            llm_api_key: None,
            alpha_vantage_api_key: None,
            alpha_vantage_rate_limit: 5, // free tier
        }
    }
}

impl fmt::Debug for ReportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportConfig")
            .field("request_timeout", &self.request_timeout)
            .field("llm_timeout", &self.llm_timeout)
            .field("llm_backend", &self.llm_backend)
            .field("llm_model", &self.llm_model)
            .field("ollama_command", &self.ollama_command)
            .field("llm_api_base", &self.llm_api_base)
            .field("llm_api_key", &redacted(self.llm_api_key.as_deref()))
            .field(
                "alpha_vantage_api_key",
                &redacted(self.alpha_vantage_api_key.as_deref()),
            )
            .field("alpha_vantage_rate_limit", &self.alpha_vantage_rate_limit)
            .finish()
    }
}

fn redacted(secret: Option<&str>) -> Option<&'static str> {
    secret.map(|_| "***")
}

impl ReportConfig {
    /// Create a new configuration builder
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder::default()
    }

    /// Load overrides from the process environment
    pub fn from_env() -> Result<Self> {
        Self::builder().with_vars(&ProcessEnv)?.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout.is_zero() {
            return Err(StockError::ConfigError(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        if self.llm_timeout.is_zero() {
            return Err(StockError::ConfigError(
                "llm_timeout must be greater than 0".to_string(),
            ));
        }

        if self.alpha_vantage_rate_limit == 0 {
            return Err(StockError::ConfigError(
                "alpha_vantage_rate_limit must be greater than 0".to_string(),
            ));
        }

        if self.llm_backend != LlmBackend::Disabled && self.llm_model.trim().is_empty() {
            return Err(StockError::ConfigError(
                "llm_model must not be empty".to_string(),
            ));
        }

        if self.llm_backend == LlmBackend::OpenAI && self.llm_api_base.trim().is_empty() {
            return Err(StockError::ConfigError(
                "llm_api_base required when using the OpenAI backend".to_string(),
            ));
        }

        Ok(())
    }

    /// Build the language model selected by `llm_backend`
    pub fn language_model(&self) -> Result<LanguageModel> {
        let model = match self.llm_backend {
            LlmBackend::Disabled => LanguageModel::Unavailable,
            LlmBackend::Ollama => LanguageModel::enabled(OllamaProvider::new(
                OllamaConfig::new(&self.llm_model).with_command(&self.ollama_command),
            )),
            LlmBackend::OpenAI => {
                let mut config = OpenAIConfig::new(&self.llm_model)
                    .with_api_base(&self.llm_api_base)
                    .with_timeout(self.llm_timeout.as_secs().max(1));
                if let Some(key) = &self.llm_api_key {
                    config = config.with_api_key(key);
                }
                let provider = OpenAIProvider::with_config(config)
                    .map_err(|e| StockError::ConfigError(e.to_string()))?;
                LanguageModel::enabled(provider)
            }
        };
        Ok(model)
    }
}

/// Builder for ReportConfig
#[derive(Debug, Default)]
pub struct ReportConfigBuilder {
    request_timeout: Option<Duration>,
    llm_timeout: Option<Duration>,
    llm_backend: Option<LlmBackend>,
    llm_model: Option<String>,
    ollama_command: Option<String>,
    llm_api_base: Option<String>,
    llm_api_key: Option<String>,
    alpha_vantage_api_key: Option<String>,
    alpha_vantage_rate_limit: Option<u32>,
}

impl ReportConfigBuilder {
    /// Set the market-data request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set the language-model timeout
    pub fn llm_timeout(mut self, duration: Duration) -> Self {
        self.llm_timeout = Some(duration);
        self
    }

    /// Set the language-model backend
    pub fn llm_backend(mut self, backend: LlmBackend) -> Self {
        self.llm_backend = Some(backend);
        self
    }

    /// Set the model name
    pub fn llm_model(mut self, model: impl Into<String>) -> Self {
        self.llm_model = Some(model.into());
        self
    }

    /// Set the Ollama binary
    pub fn ollama_command(mut self, command: impl Into<String>) -> Self {
        self.ollama_command = Some(command.into());
        self
    }

    /// Set the OpenAI-compatible base URL
    pub fn llm_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.llm_api_base = Some(api_base.into());
        self
    }

    /// Set the OpenAI-compatible API key
    pub fn llm_api_key(mut self, key: impl Into<String>) -> Self {
        self.llm_api_key = Some(key.into());
        self
    }

    /// Set Alpha Vantage API key
    pub fn alpha_vantage_api_key(mut self, key: impl Into<String>) -> Self {
        self.alpha_vantage_api_key = Some(key.into());
        self
    }

    /// Set the Alpha Vantage rate limit (requests per minute)
    pub fn alpha_vantage_rate_limit(mut self, per_minute: u32) -> Self {
        self.alpha_vantage_rate_limit = Some(per_minute);
        self
    }

    /// Apply overrides from a variable source
    ///
    /// Only variables that are set replace builder values.
    pub fn with_vars(mut self, vars: &impl VarSource) -> Result<Self> {
        if let Some(secs) = parse_var::<u64>(vars, "STOCK_REPORT_REQUEST_TIMEOUT_SECS")? {
            self.request_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(secs) = parse_var::<u64>(vars, "STOCK_REPORT_LLM_TIMEOUT_SECS")? {
            self.llm_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(backend) = parse_var::<LlmBackend>(vars, "STOCK_REPORT_LLM_BACKEND")? {
            self.llm_backend = Some(backend);
        }
        if let Some(model) = string_var(vars, "STOCK_REPORT_LLM_MODEL") {
            self.llm_model = Some(model);
        }
        if let Some(command) = string_var(vars, "OLLAMA_BIN") {
            self.ollama_command = Some(command);
        }
        if let Some(api_base) = string_var(vars, "OPENAI_API_BASE") {
            self.llm_api_base = Some(api_base);
        }
        if let Some(key) = string_var(vars, "OPENAI_API_KEY") {
            self.llm_api_key = Some(key);
        }
        if let Some(key) = string_var(vars, "ALPHA_VANTAGE_API_KEY") {
            self.alpha_vantage_api_key = Some(key);
        }
        if let Some(limit) = parse_var::<u32>(vars, "ALPHA_VANTAGE_RATE_LIMIT")? {
            self.alpha_vantage_rate_limit = Some(limit);
        }
        Ok(self)
    }

    /// Build the configuration
    pub fn build(self) -> Result<ReportConfig> {
        let defaults = ReportConfig::default();

        let config = ReportConfig {
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            llm_timeout: self.llm_timeout.unwrap_or(defaults.llm_timeout),
            llm_backend: self.llm_backend.unwrap_or(defaults.llm_backend),
            llm_model: self.llm_model.unwrap_or(defaults.llm_model),
            ollama_command: self.ollama_command.unwrap_or(defaults.ollama_command),
            llm_api_base: self.llm_api_base.unwrap_or(defaults.llm_api_base),
            llm_api_key: self.llm_api_key,
            alpha_vantage_api_key: self.alpha_vantage_api_key,
            alpha_vantage_rate_limit: self
                .alpha_vantage_rate_limit
                .unwrap_or(defaults.alpha_vantage_rate_limit),
        };

        config.validate()?;
        Ok(config)
    }
}
