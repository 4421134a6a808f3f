//! Member entity - a user's membership in a server

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DomainResult;
use crate::value_objects::Snowflake;

use super::User;

/// Cache key for records scoped to a user inside a server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberKey {
    pub server_id: Snowflake,
    pub user_id: Snowflake,
}

impl MemberKey {
    pub const fn new(server_id: Snowflake, user_id: Snowflake) -> Self {
        Self { server_id, user_id }
    }
}

/// Server member entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub server_id: Snowflake,
    pub user_id: Snowflake,
    pub nickname: Option<String>,
    /// Explicitly assigned roles; the implicit everyone role is never listed
    pub role_ids: Vec<Snowflake>,
    pub joined_at: Option<DateTime<Utc>>,
    /// Server-specific avatar hash
    pub avatar: Option<String>,
    /// Membership screening not yet passed
    pub pending: bool,
    pub communication_disabled_until: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct MemberWire {
    user: User,
    #[serde(default)]
    guild_id: Option<Snowflake>,
    #[serde(default)]
    nick: Option<String>,
    #[serde(default)]
    roles: Vec<Snowflake>,
    #[serde(default)]
    joined_at: Option<DateTime<Utc>>,
    #[serde(default)]
    avatar: Option<String>,
    #[serde(default)]
    pending: bool,
    #[serde(default)]
    communication_disabled_until: Option<DateTime<Utc>>,
}

impl Member {
    /// Decode a member payload together with the user it embeds
    ///
    /// `server_id` is used when the payload itself carries no `guild_id`.
    pub fn decode(server_id: Snowflake, value: &Value) -> DomainResult<(Self, User)> {
        let wire: MemberWire = super::decode_named("Member", value)?;
        let server_id = wire.guild_id.unwrap_or(server_id);
        let mut role_ids = wire.roles;
        role_ids.retain(|&id| id != server_id);

        let member = Self {
            server_id,
            user_id: wire.user.id,
            nickname: wire.nick,
            role_ids,
            joined_at: wire.joined_at,
            avatar: wire.avatar,
            pending: wire.pending,
            communication_disabled_until: wire.communication_disabled_until,
        };
        Ok((member, wire.user))
    }

    /// Create a new Member with no roles
    pub fn new(server_id: Snowflake, user_id: Snowflake) -> Self {
        Self {
            server_id,
            user_id,
            nickname: None,
            role_ids: Vec::new(),
            joined_at: None,
            avatar: None,
            pending: false,
            communication_disabled_until: None,
        }
    }

    /// Cache key of this member
    #[inline]
    pub fn key(&self) -> MemberKey {
        MemberKey::new(self.server_id, self.user_id)
    }

    /// Get display name (nickname if set, otherwise fallback)
    pub fn display_name<'a>(&'a self, username: &'a str) -> &'a str {
        self.nickname.as_deref().unwrap_or(username)
    }

    /// Check if member has a specific role
    #[inline]
    pub fn has_role(&self, role_id: Snowflake) -> bool {
        role_id == self.server_id || self.role_ids.contains(&role_id)
    }

    /// Check if the member is timed out at the given instant
    pub fn is_timed_out_at(&self, now: DateTime<Utc>) -> bool {
        self.communication_disabled_until
            .is_some_and(|until| until > now)
    }
}
