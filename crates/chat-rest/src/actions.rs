//! Entity mutations over REST
//!
//! Every action writes the entity returned by the server into the cache before it
//! returns, so a caller that sees `Ok` also sees the change in the cache. A gateway
//! dispatch for the same change may land before or after; the last write wins.

use std::sync::Arc;

use chat_cache::EntityCache;
use chat_core::{Channel, Member, Permissions, Role, Snowflake, User};
use serde::Serialize;
use serde_json::json;

use crate::error::RestResult;
use crate::gateway::RestGateway;
use crate::route::{RestRequest, Route};

/// Partial role update; `None` fields are left unchanged
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoleUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hoist: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentionable: Option<bool>,
}

impl RoleUpdate {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    #[must_use]
    pub fn permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = Some(permissions);
        self
    }

    #[must_use]
    pub fn hoist(mut self, hoist: bool) -> Self {
        self.hoist = Some(hoist);
        self
    }

    #[must_use]
    pub fn mentionable(mut self, mentionable: bool) -> Self {
        self.mentionable = Some(mentionable);
        self
    }
}

/// Cache-updating REST operations
#[derive(Clone)]
pub struct RestActions {
    rest: Arc<dyn RestGateway>,
    cache: Arc<EntityCache>,
}

impl RestActions {
    pub fn new(rest: Arc<dyn RestGateway>, cache: Arc<EntityCache>) -> Self {
        Self { rest, cache }
    }

    #[inline]
    pub fn rest(&self) -> &Arc<dyn RestGateway> {
        &self.rest
    }

    /// Rename a channel
    pub async fn update_channel_name(
        &self,
        channel_id: Snowflake,
        name: &str,
    ) -> RestResult<Arc<Channel>> {
        let response = self
            .rest
            .execute(RestRequest::patch(
                Route::channel(channel_id),
                json!({ "name": name }),
            ))
            .await?;

        let known_server = self
            .cache
            .channels()
            .get(&channel_id)
            .and_then(|c| c.server_id);
        let channel = Arc::new(Channel::decode(&response.body, known_server)?);
        self.cache.channels().put_arc(channel.id, Arc::clone(&channel));

        tracing::debug!(channel_id = %channel_id, "Channel renamed");
        Ok(channel)
    }

    /// Modify a role
    pub async fn update_role(
        &self,
        server_id: Snowflake,
        role_id: Snowflake,
        update: &RoleUpdate,
    ) -> RestResult<Arc<Role>> {
        let body = serde_json::to_value(update)?;
        let response = self
            .rest
            .execute(RestRequest::patch(
                Route::server_role(server_id, role_id),
                body,
            ))
            .await?;

        let role = Arc::new(Role::decode(server_id, &response.body)?);
        self.cache.roles().put_arc(role.id, Arc::clone(&role));

        tracing::debug!(server_id = %server_id, role_id = %role_id, "Role updated");
        Ok(role)
    }

    /// Set or clear a member's nickname
    pub async fn update_nickname(
        &self,
        server_id: Snowflake,
        user_id: Snowflake,
        nickname: Option<&str>,
    ) -> RestResult<Arc<Member>> {
        let response = self
            .rest
            .execute(RestRequest::patch(
                Route::server_member(server_id, user_id),
                json!({ "nick": nickname }),
            ))
            .await?;

        let (member, user) = Member::decode(server_id, &response.body)?;
        let member = Arc::new(member);
        self.cache.users().put(user.id, user);
        self.cache.members().put_arc(member.key(), Arc::clone(&member));

        tracing::debug!(server_id = %server_id, user_id = %user_id, "Nickname updated");
        Ok(member)
    }

    /// Delete a message
    pub async fn delete_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
    ) -> RestResult<()> {
        self.rest
            .execute(RestRequest::delete(Route::channel_message(
                channel_id, message_id,
            )))
            .await?;

        self.cache.messages().remove(&message_id);
        Ok(())
    }

    /// Fetch a user, refreshing the cached copy
    pub async fn fetch_user(&self, user_id: Snowflake) -> RestResult<Arc<User>> {
        let response = self
            .rest
            .execute(RestRequest::get(Route::user(user_id)))
            .await?;

        let user: Arc<User> = Arc::new(chat_core::decode(&response.body)?);
        self.cache.users().put_arc(user.id, Arc::clone(&user));
        Ok(user)
    }
}
