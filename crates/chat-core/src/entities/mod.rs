//! Domain entities - immutable records mirrored from gateway and REST payloads
//!
//! Every entity is decoded in full from its JSON payload before anything else sees it.
//! Updates replace the whole record instead of mutating it in place.

mod channel;
mod emoji;
mod member;
mod message;
mod role;
mod server;
mod sticker;
mod user;
mod voice_state;

pub use channel::{
    is_category, is_server_channel, is_text_channel, is_voice_channel, Channel, ChannelKind,
    TextData, VoiceData,
};
pub use emoji::CustomEmoji;
pub use member::{Member, MemberKey};
pub use message::Message;
pub use role::Role;
pub use server::Server;
pub use sticker::{Sticker, StickerFormat};
pub use user::User;
pub use voice_state::VoiceState;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{DomainError, DomainResult};

/// Decode an entity (or any wire struct) from a JSON payload
///
/// The type's short name is attached to the error so a log line tells which record was bad.
pub fn decode<T: DeserializeOwned>(value: &Value) -> DomainResult<T> {
    decode_named(short_type_name::<T>(), value)
}

/// Decode a private wire struct, reporting errors under the public entity's name
pub(crate) fn decode_named<T: DeserializeOwned>(entity: &'static str, value: &Value) -> DomainResult<T> {
    T::deserialize(value).map_err(|e| DomainError::decode(entity, e))
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
