//! # chat-core
//!
//! Domain layer of the gateway client: snowflake identifiers, bitsets, the entity records
//! mirrored by the cache, and the typed events published when they change.
//! This crate has no knowledge of sockets, HTTP, or concurrency.

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    decode, is_category, is_server_channel, is_text_channel, is_voice_channel, Channel,
    ChannelKind, CustomEmoji, Member, MemberKey, Message, Role, Server, Sticker,
    StickerFormat, TextData, User, VoiceData, VoiceState,
};
pub use error::{DomainError, DomainResult};
pub use events::{Change, DomainEvent};
pub use traits::EventPublisher;
pub use value_objects::{Intents, Permissions, Snowflake, SnowflakeParseError};
