//! GUILD_ROLE_CREATE / GUILD_ROLE_UPDATE / GUILD_ROLE_DELETE

use chat_core::events::RoleChange;
use chat_core::{DomainEvent, Member, Role};
use serde_json::Value;

use super::{field, push_change, snowflake, HandlerResult, PacketDispatcher};

pub(super) fn on_create(ctx: &PacketDispatcher, data: &Value) -> HandlerResult<Vec<DomainEvent>> {
    let server_id = snowflake(data, "guild_id")?;
    let role = Role::decode(server_id, field(data, "role")?)?;
    let role_id = role.id;
    ctx.cache().roles().put(role_id, role);

    Ok(vec![DomainEvent::role(DomainEvent::RoleCreated, role_id, server_id)])
}

pub(super) fn on_update(ctx: &PacketDispatcher, data: &Value) -> HandlerResult<Vec<DomainEvent>> {
    let server_id = snowflake(data, "guild_id")?;
    let incoming = Role::decode(server_id, field(data, "role")?)?;
    let role_id = incoming.id;

    let roles = ctx.cache().roles();
    let Some((old, new)) = roles.replace_with(&role_id, |_| incoming.clone()) else {
        roles.put(role_id, incoming);
        return Ok(Vec::new());
    };

    let changed = |change| DomainEvent::role_changed(role_id, server_id, change);
    let mut events = Vec::new();
    push_change(&mut events, &old.name, &new.name, |c| changed(RoleChange::Name(c)));
    push_change(&mut events, &old.color, &new.color, |c| changed(RoleChange::Color(c)));
    push_change(&mut events, &old.permissions, &new.permissions, |c| {
        changed(RoleChange::Permissions(c))
    });
    push_change(&mut events, &old.position, &new.position, |c| {
        changed(RoleChange::Position(c))
    });
    push_change(&mut events, &old.hoist, &new.hoist, |c| changed(RoleChange::Hoist(c)));
    push_change(&mut events, &old.mentionable, &new.mentionable, |c| {
        changed(RoleChange::Mentionable(c))
    });
    Ok(events)
}

pub(super) fn on_delete(ctx: &PacketDispatcher, data: &Value) -> HandlerResult<Vec<DomainEvent>> {
    let server_id = snowflake(data, "guild_id")?;
    let role_id = snowflake(data, "role_id")?;
    let cache = ctx.cache();

    cache.roles().remove(&role_id);

    // The platform sends no member updates for a deleted role
    for member in cache.members_of(server_id) {
        if member.role_ids.contains(&role_id) {
            cache.members().replace_with(&member.key(), |m| Member {
                role_ids: m.role_ids.iter().copied().filter(|&id| id != role_id).collect(),
                ..m.clone()
            });
        }
    }

    Ok(vec![DomainEvent::role(DomainEvent::RoleDeleted, role_id, server_id)])
}

#[cfg(test)]
mod tests {
    use super::super::testing::Harness;
    use chat_core::events::RoleChange;
    use chat_core::{Change, DomainEvent, Member, Permissions, Snowflake};
    use serde_json::json;

    const SERVER: Snowflake = Snowflake::new(1);
    const ROLE: Snowflake = Snowflake::new(5);

    fn create(harness: &Harness) {
        harness.dispatcher.dispatch(
            "GUILD_ROLE_CREATE",
            &json!({
                "guild_id": "1",
                "role": {"id": "5", "name": "mods", "color": 0, "permissions": "2", "position": 1}
            }),
        );
    }

    #[test]
    fn test_create_and_update() {
        let harness = Harness::new();
        create(&harness);
        assert_eq!(harness.published.tags(), vec!["ROLE_CREATED"]);
        assert_eq!(harness.cache().roles().get(&ROLE).unwrap().server_id, SERVER);
        harness.published.clear();

        harness.dispatcher.dispatch(
            "GUILD_ROLE_UPDATE",
            &json!({
                "guild_id": "1",
                "role": {"id": "5", "name": "mods", "color": 255, "permissions": "6", "position": 1}
            }),
        );

        assert_eq!(
            harness.published.tags(),
            vec!["ROLE_CHANGE_COLOR", "ROLE_CHANGE_PERMISSIONS"]
        );
        match &harness.published.events()[1] {
            DomainEvent::RoleChanged(e) => assert_eq!(
                e.change,
                RoleChange::Permissions(Change::new(
                    Permissions::KICK_MEMBERS,
                    Permissions::KICK_MEMBERS | Permissions::BAN_MEMBERS
                ))
            ),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_delete_strips_role_from_members() {
        let harness = Harness::new();
        create(&harness);
        let mut member = Member::new(SERVER, Snowflake::new(20));
        member.role_ids = vec![ROLE, Snowflake::new(6)];
        harness.cache().members().put(member.key(), member);
        harness.published.clear();

        harness
            .dispatcher
            .dispatch("GUILD_ROLE_DELETE", &json!({"guild_id": "1", "role_id": "5"}));

        assert_eq!(harness.published.tags(), vec!["ROLE_DELETED"]);
        assert!(harness.cache().roles().is_empty());
        let member = harness.cache().member(SERVER, Snowflake::new(20)).unwrap();
        assert_eq!(member.role_ids, vec![Snowflake::new(6)]);
    }

    #[test]
    fn test_missing_role_object_is_rejected() {
        let harness = Harness::new();
        let err = harness
            .dispatcher
            .try_dispatch("GUILD_ROLE_CREATE", &json!({"guild_id": "1"}))
            .unwrap_err();
        assert_eq!(err.code(), "MISSING_FIELD");
    }
}
