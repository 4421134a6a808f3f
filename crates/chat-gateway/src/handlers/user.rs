//! USER_UPDATE

use chat_core::{decode, DomainEvent, User};
use serde_json::Value;

use super::member::user_changes;
use super::{HandlerResult, PacketDispatcher};

pub(super) fn on_update(ctx: &PacketDispatcher, data: &Value) -> HandlerResult<Vec<DomainEvent>> {
    let user: User = decode(data)?;
    Ok(user_changes(ctx.cache(), user))
}
