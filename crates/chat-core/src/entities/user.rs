//! User entity - a platform account as seen by the client

use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// User entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Snowflake,
    #[serde(rename = "username")]
    pub name: String,
    #[serde(default = "default_discriminator")]
    pub discriminator: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

fn default_discriminator() -> String {
    "0".to_string()
}

impl User {
    /// Create a user with only the required fields set
    pub fn new(id: Snowflake, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            discriminator: default_discriminator(),
            avatar: None,
            bot: false,
        }
    }

    /// Get the legacy tag: name#discriminator, or just the name for migrated accounts
    pub fn tag(&self) -> String {
        if self.discriminator == "0" {
            self.name.clone()
        } else {
            format!("{}#{}", self.name, self.discriminator)
        }
    }

    /// Get the avatar URL or the default avatar URL
    pub fn avatar_url(&self) -> String {
        match &self.avatar {
            Some(hash) => format!("/avatars/{}/{}.png", self.id, hash),
            None => format!("/embed/avatars/{}.png", self.default_avatar_index()),
        }
    }

    fn default_avatar_index(&self) -> u64 {
        match self.discriminator.parse::<u64>() {
            Ok(0) | Err(_) => (self.id.into_inner() >> 22) % 6,
            Ok(discriminator) => discriminator % 5,
        }
    }
}
