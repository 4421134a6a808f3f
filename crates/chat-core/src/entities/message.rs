//! Message entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DomainResult;
use crate::value_objects::Snowflake;

use super::User;

/// Message entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    pub server_id: Option<Snowflake>,
    pub author_id: Snowflake,
    pub content: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub edited_timestamp: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct MessageWire {
    id: Snowflake,
    channel_id: Snowflake,
    #[serde(default)]
    guild_id: Option<Snowflake>,
    author: User,
    #[serde(default)]
    content: String,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    edited_timestamp: Option<DateTime<Utc>>,
}

impl Message {
    /// Decode a message payload together with its author
    pub fn decode(value: &Value) -> DomainResult<(Self, User)> {
        let wire: MessageWire = super::decode_named("Message", value)?;
        let message = Self {
            id: wire.id,
            channel_id: wire.channel_id,
            server_id: wire.guild_id,
            author_id: wire.author.id,
            content: wire.content,
            timestamp: wire.timestamp,
            edited_timestamp: wire.edited_timestamp,
        };
        Ok((message, wire.author))
    }

    /// Check if message has been edited
    #[inline]
    pub fn is_edited(&self) -> bool {
        self.edited_timestamp.is_some()
    }

    /// Get a truncated preview of the message, cut on a char boundary
    pub fn preview(&self, max_len: usize) -> &str {
        if self.content.len() <= max_len {
            return &self.content;
        }
        let mut end = max_len;
        while !self.content.is_char_boundary(end) {
            end -= 1;
        }
        &self.content[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_message_with_author() {
        let (message, author) = Message::decode(&json!({
            "id": "334385199974967042",
            "channel_id": "290926798999357250",
            "guild_id": "290926798999357249",
            "author": {"id": "53908099506183680", "username": "Mason", "discriminator": "9999"},
            "content": "Supa Hot",
            "timestamp": "2017-07-11T17:27:07.299000+00:00",
            "edited_timestamp": null
        }))
        .unwrap();

        assert_eq!(message.author_id, author.id);
        assert_eq!(message.server_id, Some(Snowflake::new(290_926_798_999_357_249)));
        assert!(message.timestamp.is_some());
        assert!(!message.is_edited());
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let (mut message, _) = Message::decode(&json!({
            "id": "1", "channel_id": "2", "author": {"id": "3", "username": "a"}
        }))
        .unwrap();
        message.content = "héllo".to_string();
        assert_eq!(message.preview(2), "h");
        assert_eq!(message.preview(50), "héllo");
    }
}
