//! CHANNEL_CREATE / CHANNEL_UPDATE / CHANNEL_DELETE

use chat_core::events::ChannelChange;
use chat_core::{Channel, DomainEvent};
use serde_json::Value;

use super::{opt_snowflake, push_change, snowflake, HandlerResult, PacketDispatcher};

pub(super) fn on_create(ctx: &PacketDispatcher, data: &Value) -> HandlerResult<Vec<DomainEvent>> {
    let channel = Channel::decode(data, None)?;
    let (channel_id, server_id) = (channel.id, channel.server_id);
    ctx.cache().channels().put(channel_id, channel);

    Ok(vec![DomainEvent::channel(
        DomainEvent::ChannelCreated,
        channel_id,
        server_id,
    )])
}

pub(super) fn on_update(ctx: &PacketDispatcher, data: &Value) -> HandlerResult<Vec<DomainEvent>> {
    let incoming = Channel::decode(data, None)?;
    let (id, server_id) = (incoming.id, incoming.server_id);

    let channels = ctx.cache().channels();
    let Some((old, new)) = channels.replace_with(&id, |_| incoming.clone()) else {
        channels.put(id, incoming);
        return Ok(Vec::new());
    };

    let changed = |change| DomainEvent::channel_changed(id, server_id, change);
    let mut events = Vec::new();

    push_change(&mut events, &old.name, &new.name, |c| changed(ChannelChange::Name(c)));
    push_change(
        &mut events,
        &old.topic().map(str::to_owned),
        &new.topic().map(str::to_owned),
        |c| changed(ChannelChange::Topic(c)),
    );
    push_change(&mut events, &old.position, &new.position, |c| {
        changed(ChannelChange::Position(c))
    });
    push_change(&mut events, &old.parent_id, &new.parent_id, |c| {
        changed(ChannelChange::Parent(c))
    });

    if let (Some(before), Some(after)) = (&old.text, &new.text) {
        push_change(&mut events, &before.nsfw, &after.nsfw, |c| {
            changed(ChannelChange::Nsfw(c))
        });
        push_change(
            &mut events,
            &before.rate_limit_per_user,
            &after.rate_limit_per_user,
            |c| changed(ChannelChange::Slowmode(c)),
        );
    }
    if let (Some(before), Some(after)) = (&old.voice, &new.voice) {
        push_change(&mut events, &before.bitrate, &after.bitrate, |c| {
            changed(ChannelChange::Bitrate(c))
        });
        push_change(&mut events, &before.user_limit, &after.user_limit, |c| {
            changed(ChannelChange::UserLimit(c))
        });
    }

    Ok(events)
}

pub(super) fn on_delete(ctx: &PacketDispatcher, data: &Value) -> HandlerResult<Vec<DomainEvent>> {
    let channel_id = snowflake(data, "id")?;
    let removed = ctx.cache().purge_channel(channel_id);
    let server_id = match opt_snowflake(data, "guild_id")? {
        Some(id) => Some(id),
        None => removed.and_then(|c| c.server_id),
    };

    Ok(vec![DomainEvent::channel(
        DomainEvent::ChannelDeleted,
        channel_id,
        server_id,
    )])
}
