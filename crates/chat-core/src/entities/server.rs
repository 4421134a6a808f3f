//! Server entity - a guild's own attributes
//!
//! Channels, roles, members, emoji and stickers live in their own cache stores and are
//! linked back through their `server_id`.

use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Server (guild) entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub id: Snowflake,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub owner_id: Snowflake,
    #[serde(default)]
    pub member_count: Option<u64>,
    #[serde(default)]
    pub large: bool,
    #[serde(default)]
    pub unavailable: bool,
}

impl Server {
    /// Create a new Server
    pub fn new(id: Snowflake, name: impl Into<String>, owner_id: Snowflake) -> Self {
        Self {
            id,
            name: name.into(),
            icon: None,
            owner_id,
            member_count: None,
            large: false,
            unavailable: false,
        }
    }

    /// Check if a user is the server owner
    #[inline]
    pub fn is_owner(&self, user_id: Snowflake) -> bool {
        self.owner_id == user_id
    }

    /// The implicit role every member holds shares the server's ID
    #[inline]
    pub fn everyone_role_id(&self) -> Snowflake {
        self.id
    }

    /// Get the server icon URL if set
    pub fn icon_url(&self) -> Option<String> {
        self.icon
            .as_ref()
            .map(|hash| format!("/icons/{}/{}.png", self.id, hash))
    }
}
