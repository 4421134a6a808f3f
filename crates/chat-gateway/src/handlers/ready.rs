//! READY bulk population

use chat_core::Snowflake;
use serde::Deserialize;
use serde_json::Value;

use super::{flag, server, snowflake, HandlerError, HandlerResult, PacketDispatcher};
use crate::protocol::ReadyPayload;

/// What the session needs from a READY payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyInfo {
    pub session_id: String,
    pub resume_url: Option<String>,
    pub user_id: Snowflake,
    pub server_count: usize,
}

pub(super) fn populate(ctx: &PacketDispatcher, data: &Value) -> HandlerResult<ReadyInfo> {
    let ready = ReadyPayload::deserialize(data)
        .map_err(|e| HandlerError::InvalidPayload(format!("READY: {e}")))?;

    let cache = ctx.cache();
    cache.reset();

    let user_id = ready.user.id;
    cache.users().put(user_id, ready.user);
    cache.set_current_user_id(user_id);

    let mut populated = 0usize;
    for guild in &ready.guilds {
        if flag(guild, "unavailable") {
            match snowflake(guild, "id") {
                Ok(server_id) => cache.mark_unavailable(server_id),
                Err(e) => tracing::warn!(error = %e, "Skipped server stub without id"),
            }
            continue;
        }

        match server::insert_server(cache, guild) {
            Ok(_) => populated += 1,
            Err(e) => tracing::warn!(code = e.code(), error = %e, "Skipped undecodable server in READY"),
        }
    }

    tracing::info!(
        session_id = %ready.session_id,
        user_id = %user_id,
        servers = ready.guilds.len(),
        populated,
        "Cache populated from READY"
    );

    Ok(ReadyInfo {
        session_id: ready.session_id,
        resume_url: ready.resume_gateway_url,
        user_id,
        server_count: ready.guilds.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::super::testing::Harness;
    use super::*;
    use chat_core::{Channel, User};
    use serde_json::json;

    #[test]
    fn test_populate_replaces_cache() {
        let harness = Harness::new();
        let cache = harness.cache();
        cache
            .channels()
            .put(Snowflake::new(999), Channel::new_text(Snowflake::new(999), Snowflake::new(9), "stale"));
        cache.users().put(Snowflake::new(50), User::new(Snowflake::new(50), "stale"));

        let info = harness
            .dispatcher
            .populate(&json!({
                "v": 10,
                "session_id": "abc",
                "resume_gateway_url": "wss://resume.example",
                "user": {"id": "7", "username": "bot", "bot": true},
                "guilds": [
                    {"id": "1", "unavailable": true},
                    {
                        "id": "2",
                        "name": "full",
                        "owner_id": "7",
                        "channels": [{"id": "20", "type": 0, "name": "general"}],
                        "roles": [{"id": "2", "name": "@everyone", "permissions": "0"}],
                        "members": [{"user": {"id": "7", "username": "bot"}, "roles": []}]
                    },
                    {"id": "3", "name": "broken", "channels": [{"name": "no id"}]}
                ]
            }))
            .unwrap();

        assert_eq!(
            info,
            ReadyInfo {
                session_id: "abc".to_string(),
                resume_url: Some("wss://resume.example".to_string()),
                user_id: Snowflake::new(7),
                server_count: 3,
            }
        );

        assert!(cache.is_current_user(Snowflake::new(7)));
        assert!(cache.is_unavailable(Snowflake::new(1)));
        assert!(cache.servers().contains(&Snowflake::new(2)));
        assert!(!cache.servers().contains(&Snowflake::new(3)));
        assert_eq!(cache.channels().len(), 1);
        assert!(cache.users().get(&Snowflake::new(50)).is_none());
        assert!(cache.member(Snowflake::new(2), Snowflake::new(7)).is_some());
        // Population publishes nothing by itself
        assert!(harness.published.tags().is_empty());
    }

    #[test]
    fn test_populate_requires_session_and_user() {
        let harness = Harness::new();
        let err = harness
            .dispatcher
            .populate(&json!({"guilds": []}))
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_PAYLOAD");
    }
}
