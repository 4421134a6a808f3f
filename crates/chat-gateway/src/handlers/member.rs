//! GUILD_MEMBER_ADD / GUILD_MEMBER_UPDATE / GUILD_MEMBER_REMOVE / GUILD_MEMBERS_CHUNK

use std::collections::HashSet;

use chat_cache::EntityCache;
use chat_core::events::{MemberChange, UserChange};
use chat_core::{DomainEvent, Member, MemberKey, Server, Snowflake, User};
use serde_json::Value;

use super::{decode_list, field, push_change, snowflake, HandlerResult, PacketDispatcher};

pub(super) fn on_add(ctx: &PacketDispatcher, data: &Value) -> HandlerResult<Vec<DomainEvent>> {
    let server_id = snowflake(data, "guild_id")?;
    let (member, user) = Member::decode(server_id, data)?;
    let user_id = member.user_id;
    let cache = ctx.cache();

    cache.users().put(user_id, user);
    cache.members().put(member.key(), member);
    adjust_member_count(cache, server_id, 1);

    Ok(vec![DomainEvent::member(DomainEvent::MemberJoined, server_id, user_id)])
}

pub(super) fn on_update(ctx: &PacketDispatcher, data: &Value) -> HandlerResult<Vec<DomainEvent>> {
    let server_id = snowflake(data, "guild_id")?;
    let (incoming, user) = Member::decode(server_id, data)?;
    let user_id = incoming.user_id;
    let cache = ctx.cache();

    let mut events = user_changes(cache, user);

    let members = cache.members();
    let key = MemberKey::new(server_id, user_id);
    let Some((old, new)) = members.replace_with(&key, |old| Member {
        joined_at: incoming.joined_at.or(old.joined_at),
        ..incoming.clone()
    }) else {
        members.put(key, incoming);
        return Ok(events);
    };

    let changed = |change| DomainEvent::member_changed(server_id, user_id, change);
    push_change(&mut events, &old.nickname, &new.nickname, |c| {
        changed(MemberChange::Nickname(c))
    });
    push_change(&mut events, &old.avatar, &new.avatar, |c| {
        changed(MemberChange::ServerAvatar(c))
    });
    push_change(
        &mut events,
        &old.communication_disabled_until,
        &new.communication_disabled_until,
        |c| changed(MemberChange::Timeout(c)),
    );
    push_change(&mut events, &old.pending, &new.pending, |c| {
        changed(MemberChange::Pending(c))
    });

    // The everyone role shares the server id and is never reported
    let before: HashSet<Snowflake> = old.role_ids.iter().copied().filter(|&r| r != server_id).collect();
    let after: HashSet<Snowflake> = new.role_ids.iter().copied().filter(|&r| r != server_id).collect();

    let mut removed: Vec<_> = before.difference(&after).copied().collect();
    let mut added: Vec<_> = after.difference(&before).copied().collect();
    removed.sort_unstable();
    added.sort_unstable();

    events.extend(removed.into_iter().map(|role_id| {
        DomainEvent::member_role(DomainEvent::RoleRemovedFromMember, server_id, user_id, role_id)
    }));
    events.extend(added.into_iter().map(|role_id| {
        DomainEvent::member_role(DomainEvent::RoleAddedToMember, server_id, user_id, role_id)
    }));

    Ok(events)
}

pub(super) fn on_remove(ctx: &PacketDispatcher, data: &Value) -> HandlerResult<Vec<DomainEvent>> {
    let server_id = snowflake(data, "guild_id")?;
    let user_id = snowflake(field(data, "user")?, "id")?;
    let cache = ctx.cache();
    let key = MemberKey::new(server_id, user_id);

    cache.members().remove(&key);
    cache.voice_states().remove(&key);
    adjust_member_count(cache, server_id, -1);

    Ok(vec![DomainEvent::member(DomainEvent::MemberLeft, server_id, user_id)])
}

/// Reply to a member request; fills the cache without reporting anything
pub(super) fn on_chunk(ctx: &PacketDispatcher, data: &Value) -> HandlerResult<Vec<DomainEvent>> {
    let server_id = snowflake(data, "guild_id")?;
    let members = decode_list(data, "members", |member| Member::decode(server_id, member))?;
    let cache = ctx.cache();

    tracing::debug!(server_id = %server_id, count = members.len(), "Member chunk received");
    for (member, user) in members {
        cache.users().put(user.id, user);
        cache.members().put(member.key(), member);
    }
    Ok(Vec::new())
}

/// Store the user carried by a packet, reporting what changed about it
pub(super) fn user_changes(cache: &EntityCache, user: User) -> Vec<DomainEvent> {
    let user_id = user.id;
    let Some(old) = cache.users().put(user_id, user.clone()) else {
        return Vec::new();
    };

    let mut events = Vec::new();
    push_change(&mut events, &old.name, &user.name, |c| {
        DomainEvent::user_changed(user_id, UserChange::Name(c))
    });
    push_change(&mut events, &old.discriminator, &user.discriminator, |c| {
        DomainEvent::user_changed(user_id, UserChange::Discriminator(c))
    });
    push_change(&mut events, &old.avatar, &user.avatar, |c| {
        DomainEvent::user_changed(user_id, UserChange::Avatar(c))
    });
    events
}

fn adjust_member_count(cache: &EntityCache, server_id: Snowflake, delta: i64) {
    cache.servers().replace_with(&server_id, |server| Server {
        member_count: server
            .member_count
            .map(|count| count.saturating_add_signed(delta)),
        ..server.clone()
    });
}
