//! Gateway session errors
//!
//! Only errors that end the session reach the caller of
//! [`GatewayHandle::join`](crate::GatewayHandle::join); transient ones are logged and
//! retried by the session itself.

use chat_rest::RestError;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

use crate::protocol::CloseCode;

/// Gateway session error
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The gateway rejected the token (close code 4004)
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// The gateway closed with a code that forbids reconnecting
    #[error("Gateway closed the session: {0}")]
    FatalClose(CloseCode),

    /// The reconnect attempt budget ran out
    #[error("Gave up reconnecting after {attempts} attempts")]
    ReconnectExhausted { attempts: u32 },

    /// Neither a configured URL nor a REST client to look one up
    #[error("No gateway URL configured")]
    NoGatewayUrl,

    #[error("WebSocket error: {0}")]
    WebSocket(Box<tungstenite::Error>),

    #[error("Invalid frame: {0}")]
    Json(#[from] serde_json::Error),

    #[error("REST error: {0}")]
    Rest(#[from] RestError),

    /// The session task has stopped
    #[error("Gateway session is closed")]
    Closed,

    #[error("Gateway task failed: {0}")]
    Task(String),
}

impl GatewayError {
    /// Error for a close code classified as fatal
    pub fn from_close_code(code: CloseCode) -> Self {
        match code {
            CloseCode::AuthenticationFailed => Self::AuthenticationFailed,
            other => Self::FatalClose(other),
        }
    }

    /// Whether retrying can never succeed
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::AuthenticationFailed
            | Self::FatalClose(_)
            | Self::ReconnectExhausted { .. }
            | Self::NoGatewayUrl => true,
            Self::Rest(e) => e.status() == Some(401),
            Self::WebSocket(_) | Self::Json(_) | Self::Closed | Self::Task(_) => false,
        }
    }

    /// Get a stable error code string for logs
    pub fn code(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "AUTHENTICATION_FAILED",
            Self::FatalClose(_) => "FATAL_CLOSE",
            Self::ReconnectExhausted { .. } => "RECONNECT_EXHAUSTED",
            Self::NoGatewayUrl => "NO_GATEWAY_URL",
            Self::WebSocket(_) => "WEBSOCKET",
            Self::Json(_) => "INVALID_FRAME",
            Self::Rest(_) => "REST",
            Self::Closed => "CLOSED",
            Self::Task(_) => "TASK_FAILED",
        }
    }
}

impl From<tungstenite::Error> for GatewayError {
    fn from(error: tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(error))
    }
}

/// Gateway result type
pub type GatewayResult<T> = Result<T, GatewayError>;
