//! Handler error types

use chat_core::DomainError;
use thiserror::Error;

/// Failure to apply one dispatch packet
///
/// Always contained by the dispatcher: logged, never propagated to the read loop.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Payload did not have the expected shape
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// A required field was absent or null
    #[error("Missing field `{0}`")]
    MissingField(&'static str),

    /// Entity decoding failed
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

impl HandlerError {
    /// Stable code for log fields
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPayload(_) => "INVALID_PAYLOAD",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::Domain(e) => e.code(),
        }
    }
}

/// Handler result type
pub type HandlerResult<T> = Result<T, HandlerError>;
