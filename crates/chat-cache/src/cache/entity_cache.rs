//! In-memory mirror of every entity the gateway has told us about
//!
//! One store per entity class, so a REST-driven write to a role never contends with a
//! gateway write to a message.

use std::sync::Arc;

use chat_core::{
    Channel, CustomEmoji, Member, MemberKey, Message, Role, Server, Snowflake, Sticker, User,
    VoiceState,
};
use dashmap::DashSet;
use parking_lot::RwLock;

use crate::store::EntityStore;

/// Thread-safe entity cache
#[derive(Debug, Default)]
pub struct EntityCache {
    servers: EntityStore<Snowflake, Server>,
    channels: EntityStore<Snowflake, Channel>,
    users: EntityStore<Snowflake, User>,
    roles: EntityStore<Snowflake, Role>,
    members: EntityStore<MemberKey, Member>,
    emojis: EntityStore<Snowflake, CustomEmoji>,
    stickers: EntityStore<Snowflake, Sticker>,
    messages: EntityStore<Snowflake, Message>,
    voice_states: EntityStore<MemberKey, VoiceState>,

    /// Servers announced in READY or lost to an outage, not yet received
    unavailable_servers: DashSet<Snowflake>,

    current_user_id: RwLock<Option<Snowflake>>,
}

impl EntityCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new cache wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    // =========================================================================
    // Stores
    // =========================================================================

    #[inline]
    pub fn servers(&self) -> &EntityStore<Snowflake, Server> {
        &self.servers
    }

    #[inline]
    pub fn channels(&self) -> &EntityStore<Snowflake, Channel> {
        &self.channels
    }

    #[inline]
    pub fn users(&self) -> &EntityStore<Snowflake, User> {
        &self.users
    }

    #[inline]
    pub fn roles(&self) -> &EntityStore<Snowflake, Role> {
        &self.roles
    }

    #[inline]
    pub fn members(&self) -> &EntityStore<MemberKey, Member> {
        &self.members
    }

    #[inline]
    pub fn emojis(&self) -> &EntityStore<Snowflake, CustomEmoji> {
        &self.emojis
    }

    #[inline]
    pub fn stickers(&self) -> &EntityStore<Snowflake, Sticker> {
        &self.stickers
    }

    #[inline]
    pub fn messages(&self) -> &EntityStore<Snowflake, Message> {
        &self.messages
    }

    #[inline]
    pub fn voice_states(&self) -> &EntityStore<MemberKey, VoiceState> {
        &self.voice_states
    }

    // =========================================================================
    // Current user
    // =========================================================================

    pub fn current_user_id(&self) -> Option<Snowflake> {
        *self.current_user_id.read()
    }

    pub fn set_current_user_id(&self, user_id: Snowflake) {
        *self.current_user_id.write() = Some(user_id);
    }

    pub fn current_user(&self) -> Option<Arc<User>> {
        self.current_user_id().and_then(|id| self.users.get(&id))
    }

    #[inline]
    pub fn is_current_user(&self, user_id: Snowflake) -> bool {
        self.current_user_id() == Some(user_id)
    }

    // =========================================================================
    // Availability
    // =========================================================================

    pub fn mark_unavailable(&self, server_id: Snowflake) {
        self.unavailable_servers.insert(server_id);
    }

    /// Returns true if the server was previously unavailable
    pub fn mark_available(&self, server_id: Snowflake) -> bool {
        self.unavailable_servers.remove(&server_id).is_some()
    }

    pub fn is_unavailable(&self, server_id: Snowflake) -> bool {
        self.unavailable_servers.contains(&server_id)
    }

    pub fn unavailable_servers(&self) -> Vec<Snowflake> {
        self.unavailable_servers.iter().map(|r| *r).collect()
    }

    // =========================================================================
    // Server scoped views
    // =========================================================================

    /// Channels of a server, ordered by position
    pub fn channels_of(&self, server_id: Snowflake) -> Vec<Arc<Channel>> {
        let mut channels = self.channels.filter(|c| c.server_id == Some(server_id));
        channels.sort_by_key(|c| (c.position, c.id));
        channels
    }

    /// Roles of a server, lowest first
    pub fn roles_of(&self, server_id: Snowflake) -> Vec<Arc<Role>> {
        let mut roles = self.roles.filter(|r| r.server_id == server_id);
        roles.sort_by_key(|r| (r.position, r.id));
        roles
    }

    pub fn emojis_of(&self, server_id: Snowflake) -> Vec<Arc<CustomEmoji>> {
        self.emojis.filter(|e| e.server_id == server_id)
    }

    pub fn stickers_of(&self, server_id: Snowflake) -> Vec<Arc<Sticker>> {
        self.stickers.filter(|s| s.server_id == server_id)
    }

    pub fn members_of(&self, server_id: Snowflake) -> Vec<Arc<Member>> {
        self.members.filter(|m| m.server_id == server_id)
    }

    pub fn voice_states_of(&self, server_id: Snowflake) -> Vec<Arc<VoiceState>> {
        self.voice_states.filter(|v| v.server_id == server_id)
    }

    pub fn member(&self, server_id: Snowflake, user_id: Snowflake) -> Option<Arc<Member>> {
        self.members.get(&MemberKey::new(server_id, user_id))
    }

    /// Drop everything scoped to a server; users are shared and stay
    pub fn purge_server(&self, server_id: Snowflake) -> Option<Arc<Server>> {
        let server = self.servers.remove(&server_id);
        let channels = self
            .channels
            .remove_where(|_, c| c.server_id == Some(server_id))
            .len();
        self.roles.retain(|_, r| r.server_id != server_id);
        self.members.retain(|k, _| k.server_id != server_id);
        self.emojis.retain(|_, e| e.server_id != server_id);
        self.stickers.retain(|_, s| s.server_id != server_id);
        self.voice_states.retain(|k, _| k.server_id != server_id);
        self.messages.retain(|_, m| m.server_id != Some(server_id));
        self.unavailable_servers.remove(&server_id);

        tracing::debug!(server_id = %server_id, channels, "Server purged from cache");

        server
    }

    /// Drop messages of a deleted channel
    pub fn purge_channel(&self, channel_id: Snowflake) -> Option<Arc<Channel>> {
        self.messages.retain(|_, m| m.channel_id != channel_id);
        self.channels.remove(&channel_id)
    }

    /// Clear everything; only used when a fresh session replaces the old one
    pub fn reset(&self) {
        self.servers.clear();
        self.channels.clear();
        self.users.clear();
        self.roles.clear();
        self.members.clear();
        self.emojis.clear();
        self.stickers.clear();
        self.messages.clear();
        self.voice_states.clear();
        self.unavailable_servers.clear();
        *self.current_user_id.write() = None;

        tracing::debug!("Entity cache reset");
    }
}
