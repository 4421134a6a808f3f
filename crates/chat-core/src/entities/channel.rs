//! Channel entity - one record for every channel kind
//!
//! Capabilities are optional payloads instead of a type hierarchy: a channel that can hold
//! messages carries [`TextData`], a channel users can join carries [`VoiceData`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DomainResult;
use crate::value_objects::Snowflake;

/// Channel kind as sent in the `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ChannelKind {
    ServerText,
    Private,
    ServerVoice,
    Group,
    Category,
    ServerNews,
    ServerStage,
    ServerForum,
    /// A kind this client does not know yet
    Unknown(u8),
}

impl From<u8> for ChannelKind {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::ServerText,
            1 => Self::Private,
            2 => Self::ServerVoice,
            3 => Self::Group,
            4 => Self::Category,
            5 => Self::ServerNews,
            13 => Self::ServerStage,
            15 => Self::ServerForum,
            other => Self::Unknown(other),
        }
    }
}

impl From<ChannelKind> for u8 {
    fn from(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::ServerText => 0,
            ChannelKind::Private => 1,
            ChannelKind::ServerVoice => 2,
            ChannelKind::Group => 3,
            ChannelKind::Category => 4,
            ChannelKind::ServerNews => 5,
            ChannelKind::ServerStage => 13,
            ChannelKind::ServerForum => 15,
            ChannelKind::Unknown(other) => other,
        }
    }
}

impl ChannelKind {
    const fn has_text(self) -> bool {
        matches!(
            self,
            Self::ServerText | Self::Private | Self::Group | Self::ServerNews
        )
    }

    const fn has_voice(self) -> bool {
        matches!(self, Self::ServerVoice | Self::ServerStage)
    }
}

/// Message-related attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextData {
    pub topic: Option<String>,
    pub nsfw: bool,
    /// Slowmode in seconds
    pub rate_limit_per_user: u32,
    pub last_message_id: Option<Snowflake>,
}

/// Voice-related attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceData {
    pub bitrate: u32,
    /// 0 means unlimited
    pub user_limit: u32,
}

/// Channel entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: Snowflake,
    pub server_id: Option<Snowflake>,
    pub kind: ChannelKind,
    pub name: Option<String>,
    pub position: i32,
    pub parent_id: Option<Snowflake>,
    pub text: Option<TextData>,
    pub voice: Option<VoiceData>,
}

#[derive(Deserialize)]
struct ChannelWire {
    id: Snowflake,
    #[serde(rename = "type")]
    kind: ChannelKind,
    #[serde(default)]
    guild_id: Option<Snowflake>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    position: i32,
    #[serde(default)]
    parent_id: Option<Snowflake>,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    nsfw: bool,
    #[serde(default)]
    rate_limit_per_user: u32,
    #[serde(default)]
    last_message_id: Option<Snowflake>,
    #[serde(default)]
    bitrate: u32,
    #[serde(default)]
    user_limit: u32,
}

impl Channel {
    /// Decode a channel payload
    ///
    /// Channels nested in a server payload omit `guild_id`; `server_id` fills it in.
    pub fn decode(value: &Value, server_id: Option<Snowflake>) -> DomainResult<Self> {
        let wire: ChannelWire = super::decode_named("Channel", value)?;
        let text = wire.kind.has_text().then(|| TextData {
            topic: wire.topic,
            nsfw: wire.nsfw,
            rate_limit_per_user: wire.rate_limit_per_user,
            last_message_id: wire.last_message_id,
        });
        let voice = wire.kind.has_voice().then_some(VoiceData {
            bitrate: wire.bitrate,
            user_limit: wire.user_limit,
        });

        Ok(Self {
            id: wire.id,
            server_id: wire.guild_id.or(server_id),
            kind: wire.kind,
            name: wire.name,
            position: wire.position,
            parent_id: wire.parent_id,
            text,
            voice,
        })
    }

    /// Create a new server text channel
    pub fn new_text(id: Snowflake, server_id: Snowflake, name: impl Into<String>) -> Self {
        Self {
            id,
            server_id: Some(server_id),
            kind: ChannelKind::ServerText,
            name: Some(name.into()),
            position: 0,
            parent_id: None,
            text: Some(TextData {
                topic: None,
                nsfw: false,
                rate_limit_per_user: 0,
                last_message_id: None,
            }),
            voice: None,
        }
    }

    /// Create a new server voice channel
    pub fn new_voice(id: Snowflake, server_id: Snowflake, name: impl Into<String>) -> Self {
        Self {
            id,
            server_id: Some(server_id),
            kind: ChannelKind::ServerVoice,
            name: Some(name.into()),
            position: 0,
            parent_id: None,
            text: None,
            voice: Some(VoiceData {
                bitrate: 64_000,
                user_limit: 0,
            }),
        }
    }

    /// Get the topic, if this channel has one
    pub fn topic(&self) -> Option<&str> {
        self.text.as_ref().and_then(|t| t.topic.as_deref())
    }

    /// Get display name (channel name or fallback for private channels)
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Direct Message")
    }
}

/// Check if the channel can hold messages
#[inline]
pub fn is_text_channel(channel: &Channel) -> bool {
    channel.text.is_some()
}

/// Check if users can join the channel for voice
#[inline]
pub fn is_voice_channel(channel: &Channel) -> bool {
    channel.voice.is_some()
}

/// Check if the channel belongs to a server
#[inline]
pub fn is_server_channel(channel: &Channel) -> bool {
    channel.server_id.is_some()
}

/// Check if the channel is a category
#[inline]
pub fn is_category(channel: &Channel) -> bool {
    channel.kind == ChannelKind::Category
}
