//! Ollama provider driven through the `ollama` command-line binary
//!
//! Each call spawns `ollama run <model>`, writes the prompt to the child's
//! stdin, closes it, and collects stdout as the answer.

use crate::{LLMError, LLMProvider, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

const DEFAULT_COMMAND: &str = "ollama";
const DEFAULT_MODEL: &str = "EntropyYue/chatglm3";

/// Configuration for the Ollama provider
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Binary to execute (default: "ollama")
    pub command: String,

    /// Model tag passed to `ollama run`
    pub model: String,
}

impl OllamaConfig {
    /// Create a config for `model` using the default binary
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            command: DEFAULT_COMMAND.to_string(),
            model: model.into(),
        }
    }

    /// Use a different binary (absolute path or name on `PATH`)
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}

/// Ollama provider
pub struct OllamaProvider {
    config: OllamaConfig,
}

impl OllamaProvider {
    /// Create a new provider
    pub fn new(config: OllamaConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl LLMProvider for OllamaProvider {
    #[instrument(skip(self, prompt), fields(model = %self.config.model))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let mut child = Command::new(&self.config.command)
            .arg("run")
            .arg(&self.config.model)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                LLMError::Unavailable(format!("failed to start {}: {e}", self.config.command))
            })?;

        debug!("Spawned {} run {}", self.config.command, self.config.model);

        // Dropping stdin after the write signals end of prompt. A child that exits
        // early closes the pipe; its exit status and stderr are reported below.
        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(prompt.as_bytes()).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    debug!("Child closed stdin before reading the full prompt");
                }
                Err(e) => {
                    return Err(LLMError::RequestFailed(format!(
                        "failed to write prompt: {e}"
                    )));
                }
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| LLMError::RequestFailed(format!("failed to read output: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LLMError::ProviderError(format!(
                "ollama exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            return Err(LLMError::UnexpectedResponse(
                "ollama produced no output".to_string(),
            ));
        }

        Ok(text)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
