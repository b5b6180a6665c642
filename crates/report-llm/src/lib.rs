//! Language-model boundary for stock-report
//!
//! The report pipeline treats text generation as an optional, injected
//! capability. This crate provides:
//!
//! - [`LLMProvider`]: the trait every backend implements (`generate(prompt) -> text`)
//! - [`LanguageModel`]: the capability handed to the pipeline, with an explicit
//!   `Unavailable` variant and a bounded-time `generate`
//! - Concrete providers (behind feature flags): a locally installed Ollama
//!   binary driven over stdin/stdout, and any OpenAI-compatible HTTP endpoint

pub mod error;
pub mod language_model;
pub mod provider;

// Re-export main types
pub use error::{LLMError, Result};
pub use language_model::LanguageModel;
pub use provider::LLMProvider;

// Provider implementations (feature-gated)
#[cfg(any(feature = "ollama", feature = "openai"))]
pub mod providers;
