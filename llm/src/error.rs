use thiserror::Error;

/// Errors from the model client.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API key not set; export {var} to use the model generator")]
    MissingApiKey { var: String },

    #[error("request failed: {0}")]
    Http(String),

    #[error("API returned status {0}")]
    Status(u16),

    #[error("response contained no candidate text")]
    EmptyResponse,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LlmError>;
