//! MESSAGE_CREATE / MESSAGE_UPDATE / MESSAGE_DELETE / MESSAGE_DELETE_BULK

use chat_core::events::{MessageEditedEvent, MessagesBulkDeletedEvent};
use chat_core::{decode, Change, DomainEvent, Message, Snowflake};
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{field, opt_snowflake, snowflake, HandlerResult, PacketDispatcher};

pub(super) fn on_create(ctx: &PacketDispatcher, data: &Value) -> HandlerResult<Vec<DomainEvent>> {
    let (message, author) = Message::decode(data)?;
    let (message_id, channel_id, server_id) = (message.id, message.channel_id, message.server_id);
    let cache = ctx.cache();

    cache.users().compute_if_absent(author.id, || author);
    cache.messages().put(message_id, message);

    Ok(vec![DomainEvent::message(
        DomainEvent::MessageCreated,
        message_id,
        channel_id,
        server_id,
    )])
}

pub(super) fn on_update(ctx: &PacketDispatcher, data: &Value) -> HandlerResult<Vec<DomainEvent>> {
    // Embed-only updates carry no content
    let Some(content) = data.get("content").and_then(Value::as_str) else {
        return Ok(Vec::new());
    };
    let message_id = snowflake(data, "id")?;
    let channel_id = snowflake(data, "channel_id")?;
    let server_id = opt_snowflake(data, "guild_id")?;
    let edited_at: Option<DateTime<Utc>> = match data.get("edited_timestamp") {
        Some(value) if !value.is_null() => Some(decode(value)?),
        _ => None,
    };

    let old_content = ctx
        .cache()
        .messages()
        .replace_with(&message_id, |old| Message {
            content: content.to_string(),
            edited_timestamp: edited_at.or(old.edited_timestamp),
            ..old.clone()
        })
        .map(|(old, _)| old.content.clone());

    if old_content.as_deref() == Some(content) {
        return Ok(Vec::new());
    }

    Ok(vec![DomainEvent::MessageEdited(MessageEditedEvent {
        message_id,
        channel_id,
        server_id,
        content: Change::new(old_content, Some(content.to_string())),
        timestamp: Utc::now(),
    })])
}

pub(super) fn on_delete(ctx: &PacketDispatcher, data: &Value) -> HandlerResult<Vec<DomainEvent>> {
    let message_id = snowflake(data, "id")?;
    let channel_id = snowflake(data, "channel_id")?;
    let server_id = opt_snowflake(data, "guild_id")?;

    ctx.cache().messages().remove(&message_id);

    Ok(vec![DomainEvent::message(
        DomainEvent::MessageDeleted,
        message_id,
        channel_id,
        server_id,
    )])
}

pub(super) fn on_delete_bulk(
    ctx: &PacketDispatcher,
    data: &Value,
) -> HandlerResult<Vec<DomainEvent>> {
    let message_ids: Vec<Snowflake> = decode(field(data, "ids")?)?;
    let channel_id = snowflake(data, "channel_id")?;
    let server_id = opt_snowflake(data, "guild_id")?;

    let messages = ctx.cache().messages();
    for id in &message_ids {
        messages.remove(id);
    }

    Ok(vec![DomainEvent::MessagesBulkDeleted(MessagesBulkDeletedEvent {
        message_ids,
        channel_id,
        server_id,
        timestamp: Utc::now(),
    })])
}
