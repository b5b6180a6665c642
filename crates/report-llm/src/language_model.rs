//! The optional text-generation capability handed to the report pipeline

use crate::{LLMError, LLMProvider, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// An injected language model, or the explicit absence of one
#[derive(Clone)]
pub enum LanguageModel {
    /// Generation is delegated to a provider
    Enabled(Arc<dyn LLMProvider>),
    /// No model configured; every call fails with [`LLMError::Unavailable`]
    Unavailable,
}

impl LanguageModel {
    /// Wrap a provider
    pub fn enabled(provider: impl LLMProvider + 'static) -> Self {
        Self::Enabled(Arc::new(provider))
    }

    /// Whether a provider is attached
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled(_))
    }

    /// Provider name, or `"unavailable"`
    pub fn name(&self) -> &str {
        match self {
            Self::Enabled(provider) => provider.name(),
            Self::Unavailable => "unavailable",
        }
    }

    /// Generate text for `prompt`, giving up after `timeout`
    pub async fn generate(&self, prompt: &str, timeout: Duration) -> Result<String> {
        let provider = match self {
            Self::Enabled(provider) => provider,
            Self::Unavailable => {
                return Err(LLMError::Unavailable(
                    "no language model configured".to_string(),
                ));
            }
        };

        debug!(provider = provider.name(), "Requesting generation");
        tokio::time::timeout(timeout, provider.generate(prompt))
            .await
            .map_err(|_| LLMError::Timeout(timeout))?
    }
}

impl Default for LanguageModel {
    fn default() -> Self {
        Self::Unavailable
    }
}

impl std::fmt::Debug for LanguageModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("LanguageModel").field(&self.name()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct EchoProvider;

    #[async_trait]
    impl LLMProvider for EchoProvider {
        async fn generate(&self, prompt: &str) -> Result<String> {
            Ok(format!("echo: {prompt}"))
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl LLMProvider for SlowProvider {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("too late".to_string())
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_unavailable_model() {
        let model = LanguageModel::Unavailable;
        let err = model
            .generate("hello", Duration::from_secs(1))
            .await
            .unwrap_err();

        assert!(matches!(err, LLMError::Unavailable(_)));
        assert!(!model.is_enabled());
    }

    #[tokio::test]
    async fn test_enabled_model_delegates() {
        let model = LanguageModel::enabled(EchoProvider);
        let text = model
            .generate("AAPL", Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(text, "echo: AAPL");
        assert_eq!(model.name(), "echo");
    }

    #[tokio::test]
    async fn test_timeout() {
        let model = LanguageModel::enabled(SlowProvider);
        let err = model
            .generate("AAPL", Duration::from_millis(20))
            .await
            .unwrap_err();

        assert!(matches!(err, LLMError::Timeout(_)));
        assert_eq!(err.to_string(), "Language model timed out after 20ms");
    }

    #[test]
    fn test_default_is_unavailable() {
        assert!(!LanguageModel::default().is_enabled());
        assert_eq!(format!("{:?}", LanguageModel::default()), "LanguageModel(\"unavailable\")");
    }
}
