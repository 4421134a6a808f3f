//! Dispatch payloads for gateway scenarios

use serde_json::{json, Value};

/// User id the mock gateway logs the client in as
pub const ME: u64 = 7;

/// A fully available server with one text and one voice channel
pub fn server(id: u64) -> Value {
    json!({
        "id": id.to_string(),
        "name": format!("server-{id}"),
        "owner_id": ME.to_string(),
        "member_count": 1,
        "channels": [
            {"id": format!("{id}0"), "type": 0, "name": "general"},
            {"id": format!("{id}1"), "type": 2, "name": "voice", "bitrate": 64000}
        ],
        "roles": [{"id": id.to_string(), "name": "@everyone", "permissions": "0"}],
        "members": [{"user": {"id": ME.to_string(), "username": "me"}, "roles": []}]
    })
}

/// Stub for a server that is still loading
pub fn unavailable(id: u64) -> Value {
    json!({"id": id.to_string(), "unavailable": true})
}

/// READY for the current user with the given servers
pub fn ready(session_id: &str, servers: &[Value]) -> Value {
    json!({
        "session_id": session_id,
        "user": {"id": ME.to_string(), "username": "me"},
        "guilds": servers
    })
}

pub fn message_create(id: u64, channel_id: u64, content: &str) -> Value {
    json!({
        "id": id.to_string(),
        "channel_id": channel_id.to_string(),
        "author": {"id": "5", "username": "author"},
        "content": content
    })
}

pub fn voice_state(server_id: u64, user_id: u64, channel_id: Option<u64>) -> Value {
    json!({
        "guild_id": server_id.to_string(),
        "user_id": user_id.to_string(),
        "channel_id": channel_id.map(|c| c.to_string()),
        "session_id": "voice-session",
        "self_mute": false,
        "self_deaf": false,
        "mute": false,
        "deaf": false
    })
}

pub fn voice_server(server_id: u64, endpoint: &str) -> Value {
    json!({
        "guild_id": server_id.to_string(),
        "token": "voice-token",
        "endpoint": endpoint
    })
}
