//! Generative-text clients.

use std::time::Duration;

use cmdgen_core::LlmConfig;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{LlmError, Result};

/// A model that turns a prompt into text.
pub trait TextModel {
    fn complete(&self, prompt: &str) -> Result<String>;
}

impl<T: TextModel + ?Sized> TextModel for &T {
    fn complete(&self, prompt: &str) -> Result<String> {
        (**self).complete(prompt)
    }
}

impl<T: TextModel + ?Sized> TextModel for Box<T> {
    fn complete(&self, prompt: &str) -> Result<String> {
        (**self).complete(prompt)
    }
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    agent: ureq::Agent,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(endpoint: &str, model: &str, api_key: &str, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            agent,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Builds a client from configuration, reading the key from the
    /// configured environment variable.
    ///
    /// # Errors
    ///
    /// [`LlmError::MissingApiKey`] when the variable is unset or empty.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| LlmError::MissingApiKey {
                var: config.api_key_env.clone(),
            })?;
        Ok(Self::new(
            &config.endpoint,
            &config.model,
            &api_key,
            Duration::from_secs(config.request_timeout_secs),
        ))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

impl TextModel for GeminiClient {
    fn complete(&self, prompt: &str) -> Result<String> {
        let url = self.url();
        debug!(model = %self.model, prompt_len = prompt.len(), "Requesting completion");

        let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });
        let mut response = self
            .agent
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .send_json(&body)
            .map_err(|err| match err {
                ureq::Error::StatusCode(code) => LlmError::Status(code),
                err => LlmError::Http(err.to_string()),
            })?;

        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|err| LlmError::Http(err.to_string()))?;
        let value: Value = serde_json::from_str(&text)?;
        candidate_text(&value)
    }
}

/// Text of the first part of the first candidate.
fn candidate_text(response: &Value) -> Result<String> {
    response
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(LlmError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_text() {
        let response = json!({
            "candidates": [
                { "content": { "parts": [{ "text": "gcloud projects list" }], "role": "model" } }
            ]
        });
        assert_eq!(candidate_text(&response).unwrap(), "gcloud projects list");
    }

    #[test]
    fn test_missing_candidates_is_empty_response() {
        let response = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        assert!(matches!(candidate_text(&response), Err(LlmError::EmptyResponse)));
    }

    #[test]
    fn test_url_shape() {
        let client = GeminiClient::new(
            "https://example.test/v1beta/",
            "gemini-2.5-pro",
            "key",
            Duration::from_secs(5),
        );
        assert_eq!(
            client.url(),
            "https://example.test/v1beta/models/gemini-2.5-pro:generateContent"
        );
    }

    #[test]
    fn test_missing_key_is_reported() {
        let config = LlmConfig {
            api_key_env: "CMDGEN_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..LlmConfig::default()
        };
        let err = GeminiClient::from_config(&config).err().unwrap();
        assert!(err.to_string().contains("CMDGEN_TEST_KEY_THAT_IS_NEVER_SET"));
    }
}
