use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use augur_models::{AgentsConfig, ModelProvider};

use crate::claude_cli::{ClaudeCliConfig, ClaudeCliModel};
use crate::error::AgentError;
use crate::gemini::GeminiModel;

/// Generative-text capability. Mockable for testing.
///
/// No structural guarantee is made about the returned text; callers parse it.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, AgentError>;
}

/// Build the configured model backend.
///
/// Missing credentials surface here, at start-up, as [`AgentError::Config`].
pub fn build_model(config: &AgentsConfig) -> Result<Arc<dyn GenerativeModel>, AgentError> {
    let timeout = Duration::from_secs(config.timeout_seconds);
    match config.provider {
        ModelProvider::ClaudeCli => Ok(Arc::new(ClaudeCliModel::new(ClaudeCliConfig {
            model: config.model.clone(),
            timeout,
            ..ClaudeCliConfig::default()
        }))),
        ModelProvider::Gemini => Ok(Arc::new(GeminiModel::from_env(&config.model, timeout)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_claude_cli_by_default() {
        let model = build_model(&AgentsConfig::default()).unwrap();
        assert_eq!(model.name(), "claude-cli");
    }
}
