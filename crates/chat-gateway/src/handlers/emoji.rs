//! GUILD_EMOJIS_UPDATE / GUILD_STICKERS_UPDATE
//!
//! Both packets carry the full current set for a server. Individual create, delete and
//! per-field change events are synthesized by diffing against the cached set.

use std::collections::HashMap;
use std::sync::Arc;

use chat_core::events::{EmojiChange, StickerChange};
use chat_core::{Change, CustomEmoji, DomainEvent, Snowflake, Sticker};
use serde_json::Value;

use super::{decode_list, push_change, snowflake, HandlerResult, PacketDispatcher};

/// Cached set against incoming set, matched by id
struct SetDiff<T> {
    created: Vec<T>,
    deleted: Vec<Arc<T>>,
    /// `(cached, incoming)` pairs present on both sides
    survivors: Vec<(Arc<T>, T)>,
}

fn diff_by_id<T>(cached: Vec<Arc<T>>, incoming: Vec<T>, id: impl Fn(&T) -> Snowflake) -> SetDiff<T> {
    let mut remaining: HashMap<Snowflake, Arc<T>> =
        cached.into_iter().map(|item| (id(&*item), item)).collect();

    let mut created = Vec::new();
    let mut survivors = Vec::new();
    for item in incoming {
        match remaining.remove(&id(&item)) {
            Some(old) => survivors.push((old, item)),
            None => created.push(item),
        }
    }

    let mut deleted: Vec<_> = remaining.into_values().collect();
    deleted.sort_by_key(|item| id(&**item));

    SetDiff {
        created,
        deleted,
        survivors,
    }
}

pub(super) fn on_emojis_update(
    ctx: &PacketDispatcher,
    data: &Value,
) -> HandlerResult<Vec<DomainEvent>> {
    let server_id = snowflake(data, "guild_id")?;
    let incoming = decode_list(data, "emojis", |v| CustomEmoji::decode(server_id, v))?;
    let store = ctx.cache().emojis();

    let diff = diff_by_id(ctx.cache().emojis_of(server_id), incoming, |e| e.id);
    let mut events = Vec::new();

    for (old, new) in &diff.survivors {
        let emoji_id = new.id;
        push_change(&mut events, &old.name, &new.name, |c| {
            DomainEvent::emoji_changed(emoji_id, server_id, EmojiChange::Name(c))
        });
        if !old.same_whitelist(new) {
            events.push(DomainEvent::emoji_changed(
                emoji_id,
                server_id,
                EmojiChange::WhitelistedRoles(Change::new(
                    old.whitelisted_roles.clone(),
                    new.whitelisted_roles.clone(),
                )),
            ));
        }
    }
    for old in &diff.deleted {
        store.remove(&old.id);
        events.push(DomainEvent::emoji(DomainEvent::CustomEmojiDeleted, old.id, server_id));
    }
    for (_, new) in diff.survivors {
        store.put(new.id, new);
    }
    for new in diff.created {
        events.push(DomainEvent::emoji(DomainEvent::CustomEmojiCreated, new.id, server_id));
        store.put(new.id, new);
    }

    Ok(events)
}

pub(super) fn on_stickers_update(
    ctx: &PacketDispatcher,
    data: &Value,
) -> HandlerResult<Vec<DomainEvent>> {
    let server_id = snowflake(data, "guild_id")?;
    let incoming = decode_list(data, "stickers", |v| Sticker::decode(server_id, v))?;
    let store = ctx.cache().stickers();

    let diff = diff_by_id(ctx.cache().stickers_of(server_id), incoming, |s| s.id);
    let mut events = Vec::new();

    for (old, new) in &diff.survivors {
        let changed = |change| DomainEvent::sticker_changed(new.id, server_id, change);
        push_change(&mut events, &old.name, &new.name, |c| changed(StickerChange::Name(c)));
        push_change(&mut events, &old.description, &new.description, |c| {
            changed(StickerChange::Description(c))
        });
        push_change(&mut events, &old.tags, &new.tags, |c| changed(StickerChange::Tags(c)));
    }
    for old in &diff.deleted {
        store.remove(&old.id);
        events.push(DomainEvent::sticker(DomainEvent::StickerDeleted, old.id, server_id));
    }
    for (_, new) in diff.survivors {
        store.put(new.id, new);
    }
    for new in diff.created {
        events.push(DomainEvent::sticker(DomainEvent::StickerCreated, new.id, server_id));
        store.put(new.id, new);
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::super::testing::Harness;
    use chat_core::events::{EmojiChange, StickerChange};
    use chat_core::{Change, DomainEvent, Snowflake};
    use serde_json::json;

    const SERVER: Snowflake = Snowflake::new(1);
    const A: Snowflake = Snowflake::new(10);
    const B: Snowflake = Snowflake::new(11);
    const C: Snowflake = Snowflake::new(12);

    #[test]
    fn test_emoji_set_diff() {
        let harness = Harness::new();
        harness.dispatcher.dispatch(
            "GUILD_EMOJIS_UPDATE",
            &json!({"guild_id": "1", "emojis": [{"id": "10", "name": "x"}, {"id": "11", "name": "b"}]}),
        );
        harness.published.clear();

        let published = harness
            .dispatcher
            .try_dispatch(
                "GUILD_EMOJIS_UPDATE",
                &json!({"guild_id": "1", "emojis": [{"id": "10", "name": "y"}, {"id": "12", "name": "c"}]}),
            )
            .unwrap();

        assert_eq!(published, 3);
        let events = harness.published.events();
        assert!(matches!(
            &events[0],
            DomainEvent::CustomEmojiChanged(e) if e.emoji_id == A
                && e.change == EmojiChange::Name(Change::new("x".to_string(), "y".to_string()))
        ));
        assert!(matches!(&events[1], DomainEvent::CustomEmojiDeleted(e) if e.emoji_id == B));
        assert!(matches!(&events[2], DomainEvent::CustomEmojiCreated(e) if e.emoji_id == C));

        let mut cached: Vec<_> = harness
            .cache()
            .emojis_of(SERVER)
            .iter()
            .map(|e| (e.id, e.name.clone()))
            .collect();
        cached.sort();
        assert_eq!(cached, vec![(A, "y".to_string()), (C, "c".to_string())]);
    }

    #[test]
    fn test_emoji_whitelist_change() {
        let harness = Harness::new();
        harness.dispatcher.dispatch(
            "GUILD_EMOJIS_UPDATE",
            &json!({"guild_id": "1", "emojis": [{"id": "10", "name": "x", "roles": ["5", "6"]}]}),
        );
        harness.published.clear();

        // Same set in another order is not a change
        harness.dispatcher.dispatch(
            "GUILD_EMOJIS_UPDATE",
            &json!({"guild_id": "1", "emojis": [{"id": "10", "name": "x", "roles": ["6", "5"]}]}),
        );
        assert!(harness.published.tags().is_empty());

        harness.dispatcher.dispatch(
            "GUILD_EMOJIS_UPDATE",
            &json!({"guild_id": "1", "emojis": [{"id": "10", "name": "x", "roles": ["5"]}]}),
        );
        assert_eq!(
            harness.published.tags(),
            vec!["CUSTOM_EMOJI_CHANGE_WHITELISTED_ROLES"]
        );
    }

    #[test]
    fn test_other_servers_untouched() {
        let harness = Harness::new();
        harness.dispatcher.dispatch(
            "GUILD_EMOJIS_UPDATE",
            &json!({"guild_id": "2", "emojis": [{"id": "50", "name": "other"}]}),
        );
        harness.published.clear();

        harness
            .dispatcher
            .dispatch("GUILD_EMOJIS_UPDATE", &json!({"guild_id": "1", "emojis": []}));

        assert!(harness.published.tags().is_empty());
        assert_eq!(harness.cache().emojis().len(), 1);
    }

    #[test]
    fn test_sticker_set_diff() {
        let harness = Harness::new();
        harness.dispatcher.dispatch(
            "GUILD_STICKERS_UPDATE",
            &json!({"guild_id": "1", "stickers": [
                {"id": "10", "name": "wave", "tags": "hello", "format_type": 1},
                {"id": "11", "name": "gone", "format_type": 1}
            ]}),
        );
        assert_eq!(
            harness.published.tags(),
            vec!["STICKER_CREATED", "STICKER_CREATED"]
        );
        harness.published.clear();

        harness.dispatcher.dispatch(
            "GUILD_STICKERS_UPDATE",
            &json!({"guild_id": "1", "stickers": [
                {"id": "10", "name": "wave", "tags": "hi", "description": "waves", "format_type": 1}
            ]}),
        );

        assert_eq!(
            harness.published.tags(),
            vec![
                "STICKER_CHANGE_DESCRIPTION",
                "STICKER_CHANGE_TAGS",
                "STICKER_DELETED"
            ]
        );
        match &harness.published.events()[1] {
            DomainEvent::StickerChanged(e) => assert_eq!(
                e.change,
                StickerChange::Tags(Change::new("hello".to_string(), "hi".to_string()))
            ),
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(harness.cache().stickers_of(SERVER).len(), 1);
        assert_eq!(
            harness.cache().stickers().get(&A).unwrap().tags,
            "hi".to_string()
        );
    }
}
