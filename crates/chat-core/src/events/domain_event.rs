//! Domain events - typed events published after the cache has changed
//!
//! Change events carry both sides of the change. The old value is always captured from
//! the cache before the cache is written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{Permissions, Snowflake};

/// Before/after pair of a single field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change<T> {
    pub old: T,
    pub new: T,
}

impl<T: PartialEq + Clone> Change<T> {
    pub fn new(old: T, new: T) -> Self {
        Self { old, new }
    }

    /// A change only if the two values differ
    pub fn between(old: &T, new: &T) -> Option<Self> {
        (old != new).then(|| Self::new(old.clone(), new.clone()))
    }
}

/// All events the client publishes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainEvent {
    // =========================================================================
    // Connection Events
    // =========================================================================
    Ready(ReadyEvent),
    Resumed(ConnectionEvent),
    LostConnection(LostConnectionEvent),

    // =========================================================================
    // Server Events
    // =========================================================================
    ServerJoined(ServerEvent),
    ServerLeft(ServerEvent),
    ServerBecameAvailable(ServerEvent),
    ServerBecameUnavailable(ServerEvent),
    ServerChanged(ServerChangedEvent),

    // =========================================================================
    // Channel Events
    // =========================================================================
    ChannelCreated(ChannelEvent),
    ChannelDeleted(ChannelEvent),
    ChannelChanged(ChannelChangedEvent),

    // =========================================================================
    // Role Events
    // =========================================================================
    RoleCreated(RoleEvent),
    RoleDeleted(RoleEvent),
    RoleChanged(RoleChangedEvent),

    // =========================================================================
    // Member & User Events
    // =========================================================================
    MemberJoined(MemberEvent),
    MemberLeft(MemberEvent),
    MemberChanged(MemberChangedEvent),
    RoleAddedToMember(MemberRoleEvent),
    RoleRemovedFromMember(MemberRoleEvent),
    UserChanged(UserChangedEvent),

    // =========================================================================
    // Emoji & Sticker Events
    // =========================================================================
    CustomEmojiCreated(EmojiEvent),
    CustomEmojiDeleted(EmojiEvent),
    CustomEmojiChanged(EmojiChangedEvent),
    StickerCreated(StickerEvent),
    StickerDeleted(StickerEvent),
    StickerChanged(StickerChangedEvent),

    // =========================================================================
    // Message Events
    // =========================================================================
    MessageCreated(MessageEvent),
    MessageEdited(MessageEditedEvent),
    MessageDeleted(MessageEvent),
    MessagesBulkDeleted(MessagesBulkDeletedEvent),

    // =========================================================================
    // Voice Events
    // =========================================================================
    VoiceChannelJoined(VoiceChannelEvent),
    VoiceChannelLeft(VoiceChannelEvent),
    VoiceChannelMoved(VoiceChannelMovedEvent),
    VoiceStateChanged(VoiceStateChangedEvent),
    VoiceServerUpdated(VoiceServerUpdatedEvent),
}

impl DomainEvent {
    /// Get the event bus tag
    ///
    /// Change events are tagged per field so listeners can subscribe to a single field.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Ready(_) => "READY",
            Self::Resumed(_) => "RESUMED",
            Self::LostConnection(_) => "LOST_CONNECTION",
            Self::ServerJoined(_) => "SERVER_JOINED",
            Self::ServerLeft(_) => "SERVER_LEFT",
            Self::ServerBecameAvailable(_) => "SERVER_BECAME_AVAILABLE",
            Self::ServerBecameUnavailable(_) => "SERVER_BECAME_UNAVAILABLE",
            Self::ServerChanged(e) => e.change.tag(),
            Self::ChannelCreated(_) => "CHANNEL_CREATED",
            Self::ChannelDeleted(_) => "CHANNEL_DELETED",
            Self::ChannelChanged(e) => e.change.tag(),
            Self::RoleCreated(_) => "ROLE_CREATED",
            Self::RoleDeleted(_) => "ROLE_DELETED",
            Self::RoleChanged(e) => e.change.tag(),
            Self::MemberJoined(_) => "MEMBER_JOINED",
            Self::MemberLeft(_) => "MEMBER_LEFT",
            Self::MemberChanged(e) => e.change.tag(),
            Self::RoleAddedToMember(_) => "ROLE_ADDED_TO_MEMBER",
            Self::RoleRemovedFromMember(_) => "ROLE_REMOVED_FROM_MEMBER",
            Self::UserChanged(e) => e.change.tag(),
            Self::CustomEmojiCreated(_) => "CUSTOM_EMOJI_CREATED",
            Self::CustomEmojiDeleted(_) => "CUSTOM_EMOJI_DELETED",
            Self::CustomEmojiChanged(e) => e.change.tag(),
            Self::StickerCreated(_) => "STICKER_CREATED",
            Self::StickerDeleted(_) => "STICKER_DELETED",
            Self::StickerChanged(e) => e.change.tag(),
            Self::MessageCreated(_) => "MESSAGE_CREATED",
            Self::MessageEdited(_) => "MESSAGE_EDITED",
            Self::MessageDeleted(_) => "MESSAGE_DELETED",
            Self::MessagesBulkDeleted(_) => "MESSAGES_BULK_DELETED",
            Self::VoiceChannelJoined(_) => "VOICE_CHANNEL_JOINED",
            Self::VoiceChannelLeft(_) => "VOICE_CHANNEL_LEFT",
            Self::VoiceChannelMoved(_) => "VOICE_CHANNEL_MOVED",
            Self::VoiceStateChanged(e) => e.change.tag(),
            Self::VoiceServerUpdated(_) => "VOICE_SERVER_UPDATED",
        }
    }

    /// Server the event is scoped to, if any
    pub fn server_id(&self) -> Option<Snowflake> {
        match self {
            Self::Ready(_) | Self::Resumed(_) | Self::LostConnection(_) | Self::UserChanged(_) => {
                None
            }
            Self::ServerJoined(e)
            | Self::ServerLeft(e)
            | Self::ServerBecameAvailable(e)
            | Self::ServerBecameUnavailable(e) => Some(e.server_id),
            Self::ServerChanged(e) => Some(e.server_id),
            Self::ChannelCreated(e) | Self::ChannelDeleted(e) => e.server_id,
            Self::ChannelChanged(e) => e.server_id,
            Self::RoleCreated(e) | Self::RoleDeleted(e) => Some(e.server_id),
            Self::RoleChanged(e) => Some(e.server_id),
            Self::MemberJoined(e) | Self::MemberLeft(e) => Some(e.server_id),
            Self::MemberChanged(e) => Some(e.server_id),
            Self::RoleAddedToMember(e) | Self::RoleRemovedFromMember(e) => Some(e.server_id),
            Self::CustomEmojiCreated(e) | Self::CustomEmojiDeleted(e) => Some(e.server_id),
            Self::CustomEmojiChanged(e) => Some(e.server_id),
            Self::StickerCreated(e) | Self::StickerDeleted(e) => Some(e.server_id),
            Self::StickerChanged(e) => Some(e.server_id),
            Self::MessageCreated(e) | Self::MessageDeleted(e) => e.server_id,
            Self::MessageEdited(e) => e.server_id,
            Self::MessagesBulkDeleted(e) => e.server_id,
            Self::VoiceChannelJoined(e) | Self::VoiceChannelLeft(e) => Some(e.server_id),
            Self::VoiceChannelMoved(e) => Some(e.server_id),
            Self::VoiceStateChanged(e) => Some(e.server_id),
            Self::VoiceServerUpdated(e) => Some(e.server_id),
        }
    }

    /// Get the timestamp of the event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Ready(e) => e.timestamp,
            Self::Resumed(e) => e.timestamp,
            Self::LostConnection(e) => e.timestamp,
            Self::ServerJoined(e)
            | Self::ServerLeft(e)
            | Self::ServerBecameAvailable(e)
            | Self::ServerBecameUnavailable(e) => e.timestamp,
            Self::ServerChanged(e) => e.timestamp,
            Self::ChannelCreated(e) | Self::ChannelDeleted(e) => e.timestamp,
            Self::ChannelChanged(e) => e.timestamp,
            Self::RoleCreated(e) | Self::RoleDeleted(e) => e.timestamp,
            Self::RoleChanged(e) => e.timestamp,
            Self::MemberJoined(e) | Self::MemberLeft(e) => e.timestamp,
            Self::MemberChanged(e) => e.timestamp,
            Self::RoleAddedToMember(e) | Self::RoleRemovedFromMember(e) => e.timestamp,
            Self::UserChanged(e) => e.timestamp,
            Self::CustomEmojiCreated(e) | Self::CustomEmojiDeleted(e) => e.timestamp,
            Self::CustomEmojiChanged(e) => e.timestamp,
            Self::StickerCreated(e) | Self::StickerDeleted(e) => e.timestamp,
            Self::StickerChanged(e) => e.timestamp,
            Self::MessageCreated(e) | Self::MessageDeleted(e) => e.timestamp,
            Self::MessageEdited(e) => e.timestamp,
            Self::MessagesBulkDeleted(e) => e.timestamp,
            Self::VoiceChannelJoined(e) | Self::VoiceChannelLeft(e) => e.timestamp,
            Self::VoiceChannelMoved(e) => e.timestamp,
            Self::VoiceStateChanged(e) => e.timestamp,
            Self::VoiceServerUpdated(e) => e.timestamp,
        }
    }
}

// ============================================================================
// Field Changes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum ServerChange {
    Name(Change<String>),
    Icon(Change<Option<String>>),
    Owner(Change<Snowflake>),
}

impl ServerChange {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Name(_) => "SERVER_CHANGE_NAME",
            Self::Icon(_) => "SERVER_CHANGE_ICON",
            Self::Owner(_) => "SERVER_CHANGE_OWNER",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum ChannelChange {
    Name(Change<Option<String>>),
    Topic(Change<Option<String>>),
    Position(Change<i32>),
    Parent(Change<Option<Snowflake>>),
    Nsfw(Change<bool>),
    Slowmode(Change<u32>),
    Bitrate(Change<u32>),
    UserLimit(Change<u32>),
}

impl ChannelChange {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Name(_) => "CHANNEL_CHANGE_NAME",
            Self::Topic(_) => "CHANNEL_CHANGE_TOPIC",
            Self::Position(_) => "CHANNEL_CHANGE_POSITION",
            Self::Parent(_) => "CHANNEL_CHANGE_PARENT",
            Self::Nsfw(_) => "CHANNEL_CHANGE_NSFW",
            Self::Slowmode(_) => "CHANNEL_CHANGE_SLOWMODE",
            Self::Bitrate(_) => "CHANNEL_CHANGE_BITRATE",
            Self::UserLimit(_) => "CHANNEL_CHANGE_USER_LIMIT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum RoleChange {
    Name(Change<String>),
    Color(Change<u32>),
    Permissions(Change<Permissions>),
    Position(Change<i32>),
    Hoist(Change<bool>),
    Mentionable(Change<bool>),
}

impl RoleChange {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Name(_) => "ROLE_CHANGE_NAME",
            Self::Color(_) => "ROLE_CHANGE_COLOR",
            Self::Permissions(_) => "ROLE_CHANGE_PERMISSIONS",
            Self::Position(_) => "ROLE_CHANGE_POSITION",
            Self::Hoist(_) => "ROLE_CHANGE_HOIST",
            Self::Mentionable(_) => "ROLE_CHANGE_MENTIONABLE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum MemberChange {
    Nickname(Change<Option<String>>),
    ServerAvatar(Change<Option<String>>),
    Timeout(Change<Option<DateTime<Utc>>>),
    Pending(Change<bool>),
}

impl MemberChange {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Nickname(_) => "MEMBER_CHANGE_NICKNAME",
            Self::ServerAvatar(_) => "MEMBER_CHANGE_SERVER_AVATAR",
            Self::Timeout(_) => "MEMBER_CHANGE_TIMEOUT",
            Self::Pending(_) => "MEMBER_CHANGE_PENDING",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum UserChange {
    Name(Change<String>),
    Discriminator(Change<String>),
    Avatar(Change<Option<String>>),
}

impl UserChange {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Name(_) => "USER_CHANGE_NAME",
            Self::Discriminator(_) => "USER_CHANGE_DISCRIMINATOR",
            Self::Avatar(_) => "USER_CHANGE_AVATAR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum EmojiChange {
    Name(Change<String>),
    WhitelistedRoles(Change<Vec<Snowflake>>),
}

impl EmojiChange {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Name(_) => "CUSTOM_EMOJI_CHANGE_NAME",
            Self::WhitelistedRoles(_) => "CUSTOM_EMOJI_CHANGE_WHITELISTED_ROLES",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum StickerChange {
    Name(Change<String>),
    Description(Change<Option<String>>),
    Tags(Change<String>),
}

impl StickerChange {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Name(_) => "STICKER_CHANGE_NAME",
            Self::Description(_) => "STICKER_CHANGE_DESCRIPTION",
            Self::Tags(_) => "STICKER_CHANGE_TAGS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum VoiceStateChange {
    SelfMuted(Change<bool>),
    SelfDeafened(Change<bool>),
    Muted(Change<bool>),
    Deafened(Change<bool>),
}

impl VoiceStateChange {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::SelfMuted(_) => "VOICE_STATE_CHANGE_SELF_MUTED",
            Self::SelfDeafened(_) => "VOICE_STATE_CHANGE_SELF_DEAFENED",
            Self::Muted(_) => "VOICE_STATE_CHANGE_MUTED",
            Self::Deafened(_) => "VOICE_STATE_CHANGE_DEAFENED",
        }
    }
}

// ============================================================================
// Event Structs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadyEvent {
    pub session_id: String,
    pub user_id: Snowflake,
    pub server_count: usize,
    /// The session had been ready before and identified again
    pub reconnect: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionEvent {
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LostConnectionEvent {
    /// Whether the next handshake will be a resume
    pub resumable: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerEvent {
    pub server_id: Snowflake,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerChangedEvent {
    pub server_id: Snowflake,
    pub change: ServerChange,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelEvent {
    pub channel_id: Snowflake,
    pub server_id: Option<Snowflake>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelChangedEvent {
    pub channel_id: Snowflake,
    pub server_id: Option<Snowflake>,
    pub change: ChannelChange,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleEvent {
    pub role_id: Snowflake,
    pub server_id: Snowflake,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleChangedEvent {
    pub role_id: Snowflake,
    pub server_id: Snowflake,
    pub change: RoleChange,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberEvent {
    pub server_id: Snowflake,
    pub user_id: Snowflake,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberChangedEvent {
    pub server_id: Snowflake,
    pub user_id: Snowflake,
    pub change: MemberChange,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberRoleEvent {
    pub server_id: Snowflake,
    pub user_id: Snowflake,
    pub role_id: Snowflake,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserChangedEvent {
    pub user_id: Snowflake,
    pub change: UserChange,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmojiEvent {
    pub emoji_id: Snowflake,
    pub server_id: Snowflake,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmojiChangedEvent {
    pub emoji_id: Snowflake,
    pub server_id: Snowflake,
    pub change: EmojiChange,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StickerEvent {
    pub sticker_id: Snowflake,
    pub server_id: Snowflake,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StickerChangedEvent {
    pub sticker_id: Snowflake,
    pub server_id: Snowflake,
    pub change: StickerChange,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub message_id: Snowflake,
    pub channel_id: Snowflake,
    pub server_id: Option<Snowflake>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEditedEvent {
    pub message_id: Snowflake,
    pub channel_id: Snowflake,
    pub server_id: Option<Snowflake>,
    /// Old side is `None` when the message was not cached
    pub content: Change<Option<String>>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagesBulkDeletedEvent {
    pub message_ids: Vec<Snowflake>,
    pub channel_id: Snowflake,
    pub server_id: Option<Snowflake>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceChannelEvent {
    pub server_id: Snowflake,
    pub user_id: Snowflake,
    pub channel_id: Snowflake,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceChannelMovedEvent {
    pub server_id: Snowflake,
    pub user_id: Snowflake,
    pub channel: Change<Snowflake>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceStateChangedEvent {
    pub server_id: Snowflake,
    pub user_id: Snowflake,
    pub change: VoiceStateChange,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceServerUpdatedEvent {
    pub server_id: Snowflake,
    /// `None` while the voice server is being reallocated
    pub endpoint: Option<String>,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Event Creation Helpers
// ============================================================================

impl DomainEvent {
    pub fn server(kind: fn(ServerEvent) -> Self, server_id: Snowflake) -> Self {
        kind(ServerEvent {
            server_id,
            timestamp: Utc::now(),
        })
    }

    pub fn server_changed(server_id: Snowflake, change: ServerChange) -> Self {
        Self::ServerChanged(ServerChangedEvent {
            server_id,
            change,
            timestamp: Utc::now(),
        })
    }

    pub fn channel(
        kind: fn(ChannelEvent) -> Self,
        channel_id: Snowflake,
        server_id: Option<Snowflake>,
    ) -> Self {
        kind(ChannelEvent {
            channel_id,
            server_id,
            timestamp: Utc::now(),
        })
    }

    pub fn channel_changed(
        channel_id: Snowflake,
        server_id: Option<Snowflake>,
        change: ChannelChange,
    ) -> Self {
        Self::ChannelChanged(ChannelChangedEvent {
            channel_id,
            server_id,
            change,
            timestamp: Utc::now(),
        })
    }

    pub fn role(kind: fn(RoleEvent) -> Self, role_id: Snowflake, server_id: Snowflake) -> Self {
        kind(RoleEvent {
            role_id,
            server_id,
            timestamp: Utc::now(),
        })
    }

    pub fn role_changed(role_id: Snowflake, server_id: Snowflake, change: RoleChange) -> Self {
        Self::RoleChanged(RoleChangedEvent {
            role_id,
            server_id,
            change,
            timestamp: Utc::now(),
        })
    }

    pub fn member(kind: fn(MemberEvent) -> Self, server_id: Snowflake, user_id: Snowflake) -> Self {
        kind(MemberEvent {
            server_id,
            user_id,
            timestamp: Utc::now(),
        })
    }

    pub fn member_changed(server_id: Snowflake, user_id: Snowflake, change: MemberChange) -> Self {
        Self::MemberChanged(MemberChangedEvent {
            server_id,
            user_id,
            change,
            timestamp: Utc::now(),
        })
    }

    pub fn member_role(
        kind: fn(MemberRoleEvent) -> Self,
        server_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
    ) -> Self {
        kind(MemberRoleEvent {
            server_id,
            user_id,
            role_id,
            timestamp: Utc::now(),
        })
    }

    pub fn user_changed(user_id: Snowflake, change: UserChange) -> Self {
        Self::UserChanged(UserChangedEvent {
            user_id,
            change,
            timestamp: Utc::now(),
        })
    }

    pub fn emoji(kind: fn(EmojiEvent) -> Self, emoji_id: Snowflake, server_id: Snowflake) -> Self {
        kind(EmojiEvent {
            emoji_id,
            server_id,
            timestamp: Utc::now(),
        })
    }

    pub fn emoji_changed(emoji_id: Snowflake, server_id: Snowflake, change: EmojiChange) -> Self {
        Self::CustomEmojiChanged(EmojiChangedEvent {
            emoji_id,
            server_id,
            change,
            timestamp: Utc::now(),
        })
    }

    pub fn sticker(
        kind: fn(StickerEvent) -> Self,
        sticker_id: Snowflake,
        server_id: Snowflake,
    ) -> Self {
        kind(StickerEvent {
            sticker_id,
            server_id,
            timestamp: Utc::now(),
        })
    }

    pub fn sticker_changed(
        sticker_id: Snowflake,
        server_id: Snowflake,
        change: StickerChange,
    ) -> Self {
        Self::StickerChanged(StickerChangedEvent {
            sticker_id,
            server_id,
            change,
            timestamp: Utc::now(),
        })
    }

    pub fn message(
        kind: fn(MessageEvent) -> Self,
        message_id: Snowflake,
        channel_id: Snowflake,
        server_id: Option<Snowflake>,
    ) -> Self {
        kind(MessageEvent {
            message_id,
            channel_id,
            server_id,
            timestamp: Utc::now(),
        })
    }

    pub fn voice_channel(
        kind: fn(VoiceChannelEvent) -> Self,
        server_id: Snowflake,
        user_id: Snowflake,
        channel_id: Snowflake,
    ) -> Self {
        kind(VoiceChannelEvent {
            server_id,
            user_id,
            channel_id,
            timestamp: Utc::now(),
        })
    }

    pub fn voice_state_changed(
        server_id: Snowflake,
        user_id: Snowflake,
        change: VoiceStateChange,
    ) -> Self {
        Self::VoiceStateChanged(VoiceStateChangedEvent {
            server_id,
            user_id,
            change,
            timestamp: Utc::now(),
        })
    }
}
