//! Routes, methods and requests
//!
//! A route is an endpoint template with its parameters filled in. The template together
//! with the major parameter (the first channel or server id) identifies the rate limit
//! bucket.

use std::fmt;

use chat_core::Snowflake;
use serde_json::Value;

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Endpoint templates used by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Gateway,
    Channel,
    ChannelMessage,
    ServerRole,
    ServerMember,
    User,
}

impl Endpoint {
    #[must_use]
    pub fn template(&self) -> &'static str {
        match self {
            Self::Gateway => "/gateway",
            Self::Channel => "/channels/{channel_id}",
            Self::ChannelMessage => "/channels/{channel_id}/messages/{message_id}",
            Self::ServerRole => "/guilds/{guild_id}/roles/{role_id}",
            Self::ServerMember => "/guilds/{guild_id}/members/{user_id}",
            Self::User => "/users/{user_id}",
        }
    }
}

/// Rate limit bucket identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BucketKey {
    pub endpoint: Endpoint,
    pub major: Option<Snowflake>,
}

/// Concrete route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    endpoint: Endpoint,
    path: String,
    major: Option<Snowflake>,
}

impl Route {
    fn new(endpoint: Endpoint, path: String, major: Option<Snowflake>) -> Self {
        Self {
            endpoint,
            path,
            major,
        }
    }

    #[must_use]
    pub fn gateway() -> Self {
        Self::new(Endpoint::Gateway, "/gateway".to_string(), None)
    }

    #[must_use]
    pub fn channel(channel_id: Snowflake) -> Self {
        Self::new(
            Endpoint::Channel,
            format!("/channels/{channel_id}"),
            Some(channel_id),
        )
    }

    #[must_use]
    pub fn channel_message(channel_id: Snowflake, message_id: Snowflake) -> Self {
        Self::new(
            Endpoint::ChannelMessage,
            format!("/channels/{channel_id}/messages/{message_id}"),
            Some(channel_id),
        )
    }

    #[must_use]
    pub fn server_role(server_id: Snowflake, role_id: Snowflake) -> Self {
        Self::new(
            Endpoint::ServerRole,
            format!("/guilds/{server_id}/roles/{role_id}"),
            Some(server_id),
        )
    }

    #[must_use]
    pub fn server_member(server_id: Snowflake, user_id: Snowflake) -> Self {
        Self::new(
            Endpoint::ServerMember,
            format!("/guilds/{server_id}/members/{user_id}"),
            Some(server_id),
        )
    }

    #[must_use]
    pub fn user(user_id: Snowflake) -> Self {
        Self::new(Endpoint::User, format!("/users/{user_id}"), None)
    }

    #[inline]
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub fn major(&self) -> Option<Snowflake> {
        self.major
    }

    #[must_use]
    pub fn bucket_key(&self) -> BucketKey {
        BucketKey {
            endpoint: self.endpoint,
            major: self.major,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// A REST call
#[derive(Debug, Clone, PartialEq)]
pub struct RestRequest {
    pub method: Method,
    pub route: Route,
    pub body: Option<Value>,
}

impl RestRequest {
    #[must_use]
    pub fn new(method: Method, route: Route) -> Self {
        Self {
            method,
            route,
            body: None,
        }
    }

    #[must_use]
    pub fn get(route: Route) -> Self {
        Self::new(Method::Get, route)
    }

    #[must_use]
    pub fn delete(route: Route) -> Self {
        Self::new(Method::Delete, route)
    }

    #[must_use]
    pub fn patch(route: Route, body: Value) -> Self {
        Self::new(Method::Patch, route).with_body(body)
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Successful response
#[derive(Debug, Clone, PartialEq)]
pub struct RestResponse {
    pub status: u16,
    /// `Value::Null` for empty bodies
    pub body: Value,
}
