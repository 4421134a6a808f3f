//! Dispatch packet handlers
//!
//! Every handler follows the same order: decode the payload, capture the cached value that
//! will be the old side of a change, write the cache, then build the events. Events are
//! published only after the handler returns, so listeners always see the updated cache.

mod channel;
mod emoji;
mod error;
mod member;
mod message;
mod ready;
mod role;
mod server;
mod user;
mod voice;

pub use error::{HandlerError, HandlerResult};
pub use ready::ReadyInfo;

use std::sync::Arc;

use chat_cache::EntityCache;
use chat_core::{Change, DomainEvent, DomainResult, EventPublisher, Snowflake};
use serde_json::Value;

use crate::voice::PendingConnectionCoordinator;

/// Applies dispatch packets to the cache and publishes the resulting events
pub struct PacketDispatcher {
    cache: Arc<EntityCache>,
    publisher: Arc<dyn EventPublisher>,
    voice: Arc<PendingConnectionCoordinator>,
}

impl PacketDispatcher {
    pub fn new(
        cache: Arc<EntityCache>,
        publisher: Arc<dyn EventPublisher>,
        voice: Arc<PendingConnectionCoordinator>,
    ) -> Self {
        Self {
            cache,
            publisher,
            voice,
        }
    }

    #[inline]
    pub fn cache(&self) -> &Arc<EntityCache> {
        &self.cache
    }

    #[inline]
    pub fn voice(&self) -> &Arc<PendingConnectionCoordinator> {
        &self.voice
    }

    /// Publish an event under its own tag
    pub fn publish(&self, event: DomainEvent) {
        self.publisher.emit(event);
    }

    /// Apply one dispatch packet; returns the number of events published
    ///
    /// A malformed packet is logged and skipped.
    pub fn dispatch(&self, event_name: &str, data: &Value) -> usize {
        match self.try_dispatch(event_name, data) {
            Ok(published) => published,
            Err(e) => {
                tracing::warn!(
                    event = event_name,
                    code = e.code(),
                    error = %e,
                    "Skipped malformed dispatch packet"
                );
                0
            }
        }
    }

    /// Apply one dispatch packet, surfacing decode failures
    pub fn try_dispatch(&self, event_name: &str, data: &Value) -> HandlerResult<usize> {
        let events = match event_name {
            "GUILD_CREATE" => server::on_create(self, data)?,
            "GUILD_UPDATE" => server::on_update(self, data)?,
            "GUILD_DELETE" => server::on_delete(self, data)?,
            "CHANNEL_CREATE" => channel::on_create(self, data)?,
            "CHANNEL_UPDATE" => channel::on_update(self, data)?,
            "CHANNEL_DELETE" => channel::on_delete(self, data)?,
            "GUILD_ROLE_CREATE" => role::on_create(self, data)?,
            "GUILD_ROLE_UPDATE" => role::on_update(self, data)?,
            "GUILD_ROLE_DELETE" => role::on_delete(self, data)?,
            "GUILD_MEMBER_ADD" => member::on_add(self, data)?,
            "GUILD_MEMBER_UPDATE" => member::on_update(self, data)?,
            "GUILD_MEMBER_REMOVE" => member::on_remove(self, data)?,
            "GUILD_MEMBERS_CHUNK" => member::on_chunk(self, data)?,
            "GUILD_EMOJIS_UPDATE" => emoji::on_emojis_update(self, data)?,
            "GUILD_STICKERS_UPDATE" => emoji::on_stickers_update(self, data)?,
            "MESSAGE_CREATE" => message::on_create(self, data)?,
            "MESSAGE_UPDATE" => message::on_update(self, data)?,
            "MESSAGE_DELETE" => message::on_delete(self, data)?,
            "MESSAGE_DELETE_BULK" => message::on_delete_bulk(self, data)?,
            "USER_UPDATE" => user::on_update(self, data)?,
            "VOICE_STATE_UPDATE" => voice::on_state_update(self, data)?,
            "VOICE_SERVER_UPDATE" => voice::on_server_update(self, data)?,
            _ => {
                tracing::debug!(event = event_name, "Ignoring unhandled dispatch event");
                return Ok(0);
            }
        };

        let published = events.len();
        for event in events {
            self.publish(event);
        }
        Ok(published)
    }

    /// Replace the cache contents with a READY payload
    pub fn populate(&self, data: &Value) -> HandlerResult<ReadyInfo> {
        ready::populate(self, data)
    }
}

impl std::fmt::Debug for PacketDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacketDispatcher")
            .field("voice", &self.voice)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Payload helpers
// ============================================================================

fn field<'a>(data: &'a Value, name: &'static str) -> HandlerResult<&'a Value> {
    data.get(name)
        .filter(|v| !v.is_null())
        .ok_or(HandlerError::MissingField(name))
}

fn snowflake(data: &Value, name: &'static str) -> HandlerResult<Snowflake> {
    Ok(chat_core::decode(field(data, name)?)?)
}

fn opt_snowflake(data: &Value, name: &'static str) -> HandlerResult<Option<Snowflake>> {
    match data.get(name).filter(|v| !v.is_null()) {
        Some(value) => Ok(Some(chat_core::decode(value)?)),
        None => Ok(None),
    }
}

fn flag(data: &Value, name: &str) -> bool {
    data.get(name).and_then(Value::as_bool).unwrap_or(false)
}

/// Decode every element of an optional array field
fn decode_list<T>(
    data: &Value,
    name: &str,
    decode: impl Fn(&Value) -> DomainResult<T>,
) -> DomainResult<Vec<T>> {
    match data.get(name).and_then(Value::as_array) {
        Some(items) => items.iter().map(decode).collect(),
        None => Ok(Vec::new()),
    }
}

/// Push a change event if the two values differ
fn push_change<T: PartialEq + Clone>(
    events: &mut Vec<DomainEvent>,
    old: &T,
    new: &T,
    build: impl FnOnce(Change<T>) -> DomainEvent,
) {
    if let Some(change) = Change::between(old, new) {
        events.push(build(change));
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use chat_cache::EntityCache;
    use chat_core::{DomainEvent, EventPublisher, Snowflake, User};
    use parking_lot::Mutex;

    use super::PacketDispatcher;
    use crate::voice::{PendingConnectionCoordinator, RecordingConnector};

    /// Publisher that keeps everything it receives
    #[derive(Default)]
    pub(crate) struct RecordingPublisher {
        events: Mutex<Vec<(&'static str, DomainEvent)>>,
    }

    impl RecordingPublisher {
        pub(crate) fn tags(&self) -> Vec<&'static str> {
            self.events.lock().iter().map(|(tag, _)| *tag).collect()
        }

        pub(crate) fn events(&self) -> Vec<DomainEvent> {
            self.events.lock().iter().map(|(_, e)| e.clone()).collect()
        }

        pub(crate) fn clear(&self) {
            self.events.lock().clear();
        }
    }

    impl EventPublisher for RecordingPublisher {
        fn publish(&self, tag: &'static str, event: DomainEvent) {
            self.events.lock().push((tag, event));
        }
    }

    pub(crate) struct Harness {
        pub(crate) dispatcher: PacketDispatcher,
        pub(crate) published: Arc<RecordingPublisher>,
        pub(crate) connector: Arc<RecordingConnector>,
    }

    impl Harness {
        pub(crate) fn new() -> Self {
            let published = Arc::new(RecordingPublisher::default());
            let connector = Arc::new(RecordingConnector::default());
            let voice = Arc::new(PendingConnectionCoordinator::new(connector.clone()));
            let dispatcher =
                PacketDispatcher::new(EntityCache::new_shared(), published.clone(), voice);
            Self {
                dispatcher,
                published,
                connector,
            }
        }

        /// Harness whose cache knows the current user
        pub(crate) fn logged_in(user_id: u64) -> Self {
            let harness = Self::new();
            let cache = harness.dispatcher.cache();
            cache
                .users()
                .put(Snowflake::new(user_id), User::new(Snowflake::new(user_id), "me"));
            cache.set_current_user_id(Snowflake::new(user_id));
            harness
        }

        pub(crate) fn cache(&self) -> &EntityCache {
            self.dispatcher.cache()
        }
    }
}
