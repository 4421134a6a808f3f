//! VOICE_STATE_UPDATE / VOICE_SERVER_UPDATE
//!
//! Besides the cache, both packets feed the voice handshake for the current user.

use chat_core::events::{VoiceChannelMovedEvent, VoiceServerUpdatedEvent, VoiceStateChange};
use chat_core::{Change, DomainEvent, VoiceState};
use chrono::Utc;
use serde_json::Value;

use super::{push_change, snowflake, HandlerError, HandlerResult, PacketDispatcher};
use crate::voice::VoiceFragment;

pub(super) fn on_state_update(
    ctx: &PacketDispatcher,
    data: &Value,
) -> HandlerResult<Vec<DomainEvent>> {
    let server_id = snowflake(data, "guild_id")?;
    let state = VoiceState::decode(server_id, data)?;
    let (user_id, key) = (state.user_id, state.key());
    let cache = ctx.cache();

    let joined_channel = state.channel_id;
    let session_id = state.session_id.clone();
    let old = match joined_channel {
        Some(_) => cache.voice_states().put(key, state.clone()),
        None => cache.voice_states().remove(&key),
    };

    let mut events = Vec::new();
    match (old.as_ref().and_then(|s| s.channel_id), joined_channel) {
        (None, Some(channel_id)) => events.push(DomainEvent::voice_channel(
            DomainEvent::VoiceChannelJoined,
            server_id,
            user_id,
            channel_id,
        )),
        (Some(channel_id), None) => events.push(DomainEvent::voice_channel(
            DomainEvent::VoiceChannelLeft,
            server_id,
            user_id,
            channel_id,
        )),
        (Some(from), Some(to)) if from != to => {
            events.push(DomainEvent::VoiceChannelMoved(VoiceChannelMovedEvent {
                server_id,
                user_id,
                channel: Change::new(from, to),
                timestamp: Utc::now(),
            }));
        }
        _ => {}
    }

    if let (Some(old), Some(_)) = (&old, joined_channel) {
        let changed = |change| DomainEvent::voice_state_changed(server_id, user_id, change);
        push_change(&mut events, &old.self_mute, &state.self_mute, |c| {
            changed(VoiceStateChange::SelfMuted(c))
        });
        push_change(&mut events, &old.self_deaf, &state.self_deaf, |c| {
            changed(VoiceStateChange::SelfDeafened(c))
        });
        push_change(&mut events, &old.mute, &state.mute, |c| {
            changed(VoiceStateChange::Muted(c))
        });
        push_change(&mut events, &old.deaf, &state.deaf, |c| {
            changed(VoiceStateChange::Deafened(c))
        });
    }

    if cache.is_current_user(user_id) {
        match joined_channel {
            Some(_) => {
                ctx.voice()
                    .on_session_fragment_received(server_id, VoiceFragment::SessionId(session_id));
            }
            None => ctx.voice().on_voice_disconnect(server_id),
        }
    }

    Ok(events)
}

pub(super) fn on_server_update(
    ctx: &PacketDispatcher,
    data: &Value,
) -> HandlerResult<Vec<DomainEvent>> {
    let server_id = snowflake(data, "guild_id")?;
    let token = data
        .get("token")
        .and_then(Value::as_str)
        .ok_or(HandlerError::MissingField("token"))?;
    // Null while the voice server is being reallocated
    let endpoint = data
        .get("endpoint")
        .and_then(Value::as_str)
        .map(str::to_owned);

    if let Some(endpoint) = &endpoint {
        ctx.voice().on_session_fragment_received(
            server_id,
            VoiceFragment::TokenAndEndpoint {
                token: token.to_owned(),
                endpoint: endpoint.clone(),
            },
        );
    }

    Ok(vec![DomainEvent::VoiceServerUpdated(VoiceServerUpdatedEvent {
        server_id,
        endpoint,
        timestamp: Utc::now(),
    })])
}
