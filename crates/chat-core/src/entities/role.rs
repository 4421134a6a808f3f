//! Role entity - a server role with permissions

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DomainResult;
use crate::value_objects::{Permissions, Snowflake};

/// Role entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: Snowflake,
    /// Not part of the role payload; filled in from the enclosing packet
    #[serde(default)]
    pub server_id: Snowflake,
    pub name: String,
    #[serde(default)]
    pub color: u32,
    #[serde(default)]
    pub hoist: bool,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub permissions: Permissions,
    #[serde(default)]
    pub managed: bool,
    #[serde(default)]
    pub mentionable: bool,
}

impl Role {
    /// Decode a role payload belonging to `server_id`
    pub fn decode(server_id: Snowflake, value: &Value) -> DomainResult<Self> {
        let role: Role = super::decode(value)?;
        Ok(Self { server_id, ..role })
    }

    /// Create a new Role
    pub fn new(
        id: Snowflake,
        server_id: Snowflake,
        name: impl Into<String>,
        permissions: Permissions,
    ) -> Self {
        Self {
            id,
            server_id,
            name: name.into(),
            color: 0,
            hoist: false,
            position: 0,
            permissions,
            managed: false,
            mentionable: false,
        }
    }

    /// The implicit role every member of the server holds
    #[inline]
    pub fn is_everyone(&self) -> bool {
        self.id == self.server_id
    }

    /// Check if this role grants a specific permission
    #[inline]
    pub fn has_permission(&self, permission: Permissions) -> bool {
        self.permissions.has(permission)
    }

    /// Compare role positions for hierarchy (higher position = more authority)
    #[inline]
    pub fn is_higher_than(&self, other: &Role) -> bool {
        (self.position, other.id) > (other.position, self.id)
    }

    /// Get the color as a hex string (without #)
    pub fn color_hex(&self) -> String {
        format!("{:06x}", self.color)
    }
}
