use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::model::GenerativeModel;
use crate::prompts::ANALYST_SYSTEM_PROMPT;

#[derive(Debug, Clone)]
pub struct ClaudeCliConfig {
    /// Executable to run; resolved through PATH.
    pub binary: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for ClaudeCliConfig {
    fn default() -> Self {
        Self {
            binary: "claude".to_string(),
            model: "claude-3-5-haiku-latest".to_string(),
            timeout: Duration::from_secs(45),
        }
    }
}

/// Generative-text backend that shells out to the Claude CLI in print mode.
///
/// The child is killed if the call times out or its future is dropped.
pub struct ClaudeCliModel {
    config: ClaudeCliConfig,
}

impl ClaudeCliModel {
    pub fn new(config: ClaudeCliConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClaudeCliConfig {
        &self.config
    }

    /// Whether the configured binary runs at all.
    pub async fn available(&self) -> bool {
        match Command::new(&self.config.binary).arg("--version").output().await {
            Ok(output) => output.status.success(),
            Err(_) => false,
        }
    }

    /// One print-mode call. Returns raw stdout.
    pub async fn ask(&self, system_prompt: &str, prompt: &str) -> Result<String, AgentError> {
        let config = &self.config;
        debug!(binary = %config.binary, model = %config.model, "Invoking claude CLI");

        let output = tokio::time::timeout(
            config.timeout,
            Command::new(&config.binary)
                .args([
                    "-p",
                    prompt,
                    "--system-prompt",
                    system_prompt,
                    "--model",
                    &config.model,
                    "--output-format",
                    "text",
                ])
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| AgentError::Timeout(config.timeout.as_secs()))?
        .map_err(|e| AgentError::Cli(format!("Failed to spawn {}: {e}", config.binary)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, stderr = %stderr.trim(), "Claude CLI failed");
            return Err(AgentError::Cli(format!(
                "{} exited {}: {}",
                config.binary,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if stdout.trim().is_empty() {
            return Err(AgentError::Cli("empty response".to_string()));
        }
        Ok(stdout)
    }
}

#[async_trait]
impl GenerativeModel for ClaudeCliModel {
    fn name(&self) -> &str {
        "claude-cli"
    }

    async fn generate(&self, prompt: &str) -> Result<String, AgentError> {
        self.ask(ANALYST_SYSTEM_PROMPT, prompt).await
    }
}
