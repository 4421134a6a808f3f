//! GUILD_CREATE / GUILD_UPDATE / GUILD_DELETE

use std::sync::Arc;

use chat_cache::EntityCache;
use chat_core::events::ServerChange;
use chat_core::{
    decode, Channel, CustomEmoji, DomainEvent, Member, Role, Server, Sticker, VoiceState,
};
use serde_json::Value;

use super::{decode_list, flag, push_change, snowflake, HandlerResult, PacketDispatcher};

/// Decode a full server payload and cache it with everything it contains
///
/// Nothing is written unless the whole payload decodes. Returns the previously cached
/// server.
pub(super) fn insert_server(cache: &EntityCache, data: &Value) -> HandlerResult<Option<Arc<Server>>> {
    let mut server: Server = decode(data)?;
    let server_id = server.id;

    let channels = decode_list(data, "channels", |v| Channel::decode(v, Some(server_id)))?;
    let roles = decode_list(data, "roles", |v| Role::decode(server_id, v))?;
    let members = decode_list(data, "members", |v| Member::decode(server_id, v))?;
    let emojis = decode_list(data, "emojis", |v| CustomEmoji::decode(server_id, v))?;
    let stickers = decode_list(data, "stickers", |v| Sticker::decode(server_id, v))?;
    let voice_states = decode_list(data, "voice_states", |v| VoiceState::decode(server_id, v))?;

    for channel in channels {
        cache.channels().put(channel.id, channel);
    }
    for role in roles {
        cache.roles().put(role.id, role);
    }
    for (member, user) in members {
        cache.users().put(user.id, user);
        cache.members().put(member.key(), member);
    }
    for emoji in emojis {
        cache.emojis().put(emoji.id, emoji);
    }
    for sticker in stickers {
        cache.stickers().put(sticker.id, sticker);
    }
    for state in voice_states.into_iter().filter(|s| s.channel_id.is_some()) {
        cache.voice_states().put(state.key(), state);
    }

    server.unavailable = false;
    Ok(cache.servers().put(server_id, server))
}

pub(super) fn on_create(ctx: &PacketDispatcher, data: &Value) -> HandlerResult<Vec<DomainEvent>> {
    let cache = ctx.cache();
    let server_id = snowflake(data, "id")?;

    if flag(data, "unavailable") {
        cache.mark_unavailable(server_id);
        return Ok(Vec::new());
    }

    let previous = insert_server(cache, data)?;

    let kind = if cache.mark_available(server_id) {
        DomainEvent::ServerBecameAvailable
    } else if previous.is_none() {
        DomainEvent::ServerJoined
    } else {
        return Ok(Vec::new());
    };
    Ok(vec![DomainEvent::server(kind, server_id)])
}

pub(super) fn on_update(ctx: &PacketDispatcher, data: &Value) -> HandlerResult<Vec<DomainEvent>> {
    let incoming: Server = decode(data)?;
    let server_id = incoming.id;

    // GUILD_UPDATE carries no member count
    let Some((old, new)) = ctx.cache().servers().replace_with(&server_id, |old| Server {
        member_count: incoming.member_count.or(old.member_count),
        large: old.large,
        unavailable: false,
        ..incoming.clone()
    }) else {
        tracing::debug!(server_id = %server_id, "Update for uncached server");
        return Ok(Vec::new());
    };

    let mut events = Vec::new();
    push_change(&mut events, &old.name, &new.name, |c| {
        DomainEvent::server_changed(server_id, ServerChange::Name(c))
    });
    push_change(&mut events, &old.icon, &new.icon, |c| {
        DomainEvent::server_changed(server_id, ServerChange::Icon(c))
    });
    push_change(&mut events, &old.owner_id, &new.owner_id, |c| {
        DomainEvent::server_changed(server_id, ServerChange::Owner(c))
    });
    Ok(events)
}

pub(super) fn on_delete(ctx: &PacketDispatcher, data: &Value) -> HandlerResult<Vec<DomainEvent>> {
    let cache = ctx.cache();
    let server_id = snowflake(data, "id")?;

    if flag(data, "unavailable") {
        cache.purge_server(server_id);
        cache.mark_unavailable(server_id);
        return Ok(vec![DomainEvent::server(
            DomainEvent::ServerBecameUnavailable,
            server_id,
        )]);
    }

    let removed = cache.purge_server(server_id);
    ctx.voice().on_voice_disconnect(server_id);

    Ok(removed
        .map(|_| DomainEvent::server(DomainEvent::ServerLeft, server_id))
        .into_iter()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::super::testing::Harness;
    use chat_core::events::ServerChange;
    use chat_core::{Change, DomainEvent, Snowflake};
    use serde_json::{json, Value};

    const SERVER: Snowflake = Snowflake::new(1);

    fn full_server() -> Value {
        json!({
            "id": "1",
            "name": "home",
            "owner_id": "7",
            "member_count": 2,
            "channels": [
                {"id": "10", "type": 0, "name": "general"},
                {"id": "11", "type": 2, "name": "voice", "bitrate": 64000}
            ],
            "roles": [
                {"id": "1", "name": "@everyone", "permissions": "0"},
                {"id": "5", "name": "mods", "permissions": "8"}
            ],
            "members": [
                {"user": {"id": "7", "username": "owner"}, "roles": ["5"]},
                {"user": {"id": "8", "username": "guest"}, "roles": []}
            ],
            "emojis": [{"id": "30", "name": "wave"}],
            "stickers": [{"id": "40", "name": "hi", "format_type": 1}],
            "voice_states": [{"user_id": "8", "channel_id": "11", "session_id": "s"}]
        })
    }

    #[test]
    fn test_create_caches_children_and_joins() {
        let harness = Harness::new();
        let published = harness
            .dispatcher
            .try_dispatch("GUILD_CREATE", &full_server())
            .unwrap();

        let cache = harness.cache();
        assert_eq!(published, 1);
        assert_eq!(harness.published.tags(), vec!["SERVER_JOINED"]);
        assert_eq!(cache.channels_of(SERVER).len(), 2);
        assert_eq!(cache.roles_of(SERVER).len(), 2);
        assert_eq!(cache.members_of(SERVER).len(), 2);
        assert_eq!(cache.emojis_of(SERVER).len(), 1);
        assert_eq!(cache.stickers_of(SERVER).len(), 1);
        assert_eq!(cache.voice_states_of(SERVER).len(), 1);
        assert_eq!(cache.users().len(), 2);
    }

    #[test]
    fn test_create_after_outage_becomes_available() {
        let harness = Harness::new();
        harness
            .dispatcher
            .dispatch("GUILD_CREATE", &json!({"id": "1", "unavailable": true}));
        assert!(harness.cache().is_unavailable(SERVER));
        assert!(harness.published.tags().is_empty());

        harness.dispatcher.dispatch("GUILD_CREATE", &full_server());
        assert_eq!(harness.published.tags(), vec!["SERVER_BECAME_AVAILABLE"]);
        assert!(!harness.cache().is_unavailable(SERVER));
    }

    #[test]
    fn test_create_with_bad_child_writes_nothing() {
        let harness = Harness::new();
        let mut data = full_server();
        data["roles"] = json!([{"id": "5"}]);

        assert!(harness.dispatcher.try_dispatch("GUILD_CREATE", &data).is_err());
        assert!(harness.cache().servers().is_empty());
        assert!(harness.cache().channels().is_empty());
    }

    #[test]
    fn test_update_diffs_fields() {
        let harness = Harness::new();
        harness.dispatcher.dispatch("GUILD_CREATE", &full_server());
        harness.published.clear();

        harness.dispatcher.dispatch(
            "GUILD_UPDATE",
            &json!({"id": "1", "name": "renamed", "icon": "abc", "owner_id": "7"}),
        );

        assert_eq!(
            harness.published.tags(),
            vec!["SERVER_CHANGE_NAME", "SERVER_CHANGE_ICON"]
        );
        match &harness.published.events()[0] {
            DomainEvent::ServerChanged(e) => assert_eq!(
                e.change,
                ServerChange::Name(Change::new("home".to_string(), "renamed".to_string()))
            ),
            other => panic!("unexpected event: {other:?}"),
        }
        let server = harness.cache().servers().get(&SERVER).unwrap();
        assert_eq!(server.member_count, Some(2));
    }

    #[test]
    fn test_delete_unavailable_keeps_membership() {
        let harness = Harness::new();
        harness.dispatcher.dispatch("GUILD_CREATE", &full_server());
        harness.published.clear();

        harness
            .dispatcher
            .dispatch("GUILD_DELETE", &json!({"id": "1", "unavailable": true}));

        assert_eq!(harness.published.tags(), vec!["SERVER_BECAME_UNAVAILABLE"]);
        assert!(harness.cache().is_unavailable(SERVER));
        assert!(harness.cache().channels_of(SERVER).is_empty());
    }

    #[test]
    fn test_delete_leaves_server() {
        let harness = Harness::new();
        harness.dispatcher.dispatch("GUILD_CREATE", &full_server());
        harness.published.clear();

        harness.dispatcher.dispatch("GUILD_DELETE", &json!({"id": "1"}));
        assert_eq!(harness.published.tags(), vec!["SERVER_LEFT"]);
        assert!(harness.cache().servers().is_empty());
        assert!(harness.cache().members_of(SERVER).is_empty());
        // Users are shared across servers
        assert_eq!(harness.cache().users().len(), 2);

        // Leaving an unknown server is silent
        harness.published.clear();
        harness.dispatcher.dispatch("GUILD_DELETE", &json!({"id": "99"}));
        assert!(harness.published.tags().is_empty());
    }
}
