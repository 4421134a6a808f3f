//! Voice state - a user's presence in a server's voice channels

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DomainResult;
use crate::value_objects::Snowflake;

use super::MemberKey;

/// Voice state entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceState {
    #[serde(default, rename = "guild_id")]
    pub server_id: Snowflake,
    pub user_id: Snowflake,
    /// `None` once the user left voice
    #[serde(default)]
    pub channel_id: Option<Snowflake>,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub self_mute: bool,
    #[serde(default)]
    pub self_deaf: bool,
    #[serde(default)]
    pub mute: bool,
    #[serde(default)]
    pub deaf: bool,
}

impl VoiceState {
    /// Decode a voice state; a missing `guild_id` falls back to `server_id`
    pub fn decode(server_id: Snowflake, value: &Value) -> DomainResult<Self> {
        let state: VoiceState = super::decode(value)?;
        if state.server_id.is_zero() {
            Ok(Self { server_id, ..state })
        } else {
            Ok(state)
        }
    }

    #[inline]
    pub fn key(&self) -> MemberKey {
        MemberKey::new(self.server_id, self.user_id)
    }
}
