//! REST error types

use chat_core::DomainError;
use serde_json::Value;

/// Errors surfaced to the caller of a REST operation
#[derive(Debug, thiserror::Error)]
pub enum RestError {
    /// The route stayed rate limited for the whole retry budget
    #[error("Rate limit retries exhausted for {route}")]
    RateLimitExhausted { route: String },

    /// Non-success status other than 429
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: Value },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    #[error("Invalid response body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("Missing field in response: {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    Decode(#[from] DomainError),
}

impl RestError {
    /// HTTP status if the server answered
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::RateLimitExhausted { .. } => Some(429),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

pub type RestResult<T> = Result<T, RestError>;
