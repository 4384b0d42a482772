//! Error taxonomy for the digest pipeline.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DigestError>;

#[derive(Debug, Error)]
pub enum DigestError {
    /// Connection, DNS or timeout failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A body that is not text, or not the JSON we expected.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The structural region an article page should contain is missing.
    #[error("Selector `{selector}` not found in {url}")]
    SelectorNotFound { selector: String, url: String },

    /// Non-200 answer from a remote endpoint.
    #[error("API error: status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Run cancelled")]
    Cancelled,
}

impl DigestError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            DigestError::Transport(_) => true,
            DigestError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for DigestError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() || e.is_body() {
            DigestError::Decode(e.to_string())
        } else {
            DigestError::Transport(e.to_string())
        }
    }
}

impl From<url::ParseError> for DigestError {
    fn from(e: url::ParseError) -> Self {
        DigestError::InvalidUrl(e.to_string())
    }
}
