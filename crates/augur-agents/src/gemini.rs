use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::model::GenerativeModel;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Request header carrying the API key. The key never goes in the URL, so it
/// cannot leak through error messages that quote the request URL.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Longest slice of a non-JSON error body quoted in an error.
const ERROR_BODY_SNIPPET: usize = 200;

/// Environment variable holding the Gemini API key.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Generative-text backend for Google's Gemini `generateContent` endpoint.
pub struct GeminiModel {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiModel {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AgentError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Build from `GEMINI_API_KEY`. A missing or empty key is a configuration error.
    pub fn from_env(model: &str, timeout: Duration) -> Result<Self, AgentError> {
        let api_key = std::env::var(GEMINI_API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AgentError::Config(format!("{GEMINI_API_KEY_ENV} is not set")))?;
        Self::new(api_key, model, timeout)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Pull the first candidate's text out of a `generateContent` response body.
pub fn extract_candidate_text(body: &serde_json::Value) -> Result<String, AgentError> {
    if let Some(message) = body.pointer("/error/message").and_then(|m| m.as_str()) {
        return Err(AgentError::Api(message.to_string()));
    }

    let parts = body
        .pointer("/candidates/0/content/parts")
        .and_then(|p| p.as_array())
        .ok_or_else(|| AgentError::Api("response has no candidates".to_string()))?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
        .collect();

    if text.trim().is_empty() {
        return Err(AgentError::Api("candidate text is empty".to_string()));
    }
    Ok(text)
}

#[async_trait]
impl GenerativeModel for GeminiModel {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<String, AgentError> {
        debug!(model = %self.model, "Invoking Gemini");

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Http(e.without_url()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AgentError::Http(e.without_url()))?;

        if !status.is_success() {
            warn!(status = %status, "Gemini request failed");
            let detail = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| v.pointer("/error/message").and_then(|m| m.as_str()).map(str::to_string))
                .unwrap_or_else(|| text.trim().chars().take(ERROR_BODY_SNIPPET).collect());
            return Err(AgentError::Api(format!("{status}: {detail}")));
        }

        let payload: serde_json::Value = serde_json::from_str(&text)?;
        extract_candidate_text(&payload)
    }
}
