//! LLM provider trait definition

use crate::Result;
use async_trait::async_trait;

/// Trait for LLM providers
///
/// Implementations turn a fully formed prompt into generated text. Each call is
/// an independent request/response exchange; providers hold no conversation
/// state between calls.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion for `prompt`
    ///
    /// # Returns
    ///
    /// The generated text, trimmed of surrounding whitespace
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get the provider name (e.g., "ollama", "openai")
    fn name(&self) -> &str;
}
