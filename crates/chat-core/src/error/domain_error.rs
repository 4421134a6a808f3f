//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::Snowflake;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Decode Errors
    // =========================================================================
    #[error("Failed to decode {entity}: {reason}")]
    Decode { entity: &'static str, reason: String },

    #[error("Missing field `{field}` in {entity} payload")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },

    // =========================================================================
    // Lookup Errors
    // =========================================================================
    #[error("Server not found: {0}")]
    ServerNotFound(Snowflake),

    #[error("Channel not found: {0}")]
    ChannelNotFound(Snowflake),

    #[error("User not found: {0}")]
    UserNotFound(Snowflake),

    #[error("Role not found: {0}")]
    RoleNotFound(Snowflake),

    #[error("Member {user_id} not found in server {server_id}")]
    MemberNotFound {
        server_id: Snowflake,
        user_id: Snowflake,
    },

    #[error("Message not found: {0}")]
    MessageNotFound(Snowflake),
}

impl DomainError {
    /// Build a decode error for the given entity name
    pub fn decode(entity: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::Decode {
            entity,
            reason: reason.to_string(),
        }
    }

    /// Get a stable error code string for logs
    pub fn code(&self) -> &'static str {
        match self {
            Self::Decode { .. } => "DECODE_ERROR",
            Self::MissingField { .. } => "MISSING_FIELD",
            Self::ServerNotFound(_) => "UNKNOWN_SERVER",
            Self::ChannelNotFound(_) => "UNKNOWN_CHANNEL",
            Self::UserNotFound(_) => "UNKNOWN_USER",
            Self::RoleNotFound(_) => "UNKNOWN_ROLE",
            Self::MemberNotFound { .. } => "UNKNOWN_MEMBER",
            Self::MessageNotFound(_) => "UNKNOWN_MESSAGE",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ServerNotFound(_)
                | Self::ChannelNotFound(_)
                | Self::UserNotFound(_)
                | Self::RoleNotFound(_)
                | Self::MemberNotFound { .. }
                | Self::MessageNotFound(_)
        )
    }

    /// Check if this error came from a malformed payload
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::MissingField { .. })
    }
}

/// Result alias for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
