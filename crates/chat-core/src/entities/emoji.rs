//! Custom emoji entity

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DomainResult;
use crate::value_objects::Snowflake;

/// Custom emoji uploaded to a server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomEmoji {
    pub id: Snowflake,
    #[serde(default)]
    pub server_id: Snowflake,
    pub name: String,
    /// Roles allowed to use the emoji; empty means everyone
    #[serde(default, rename = "roles")]
    pub whitelisted_roles: Vec<Snowflake>,
    #[serde(default)]
    pub animated: bool,
    #[serde(default)]
    pub managed: bool,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl CustomEmoji {
    /// Decode an emoji payload belonging to `server_id`
    pub fn decode(server_id: Snowflake, value: &Value) -> DomainResult<Self> {
        let emoji: CustomEmoji = super::decode(value)?;
        Ok(Self { server_id, ..emoji })
    }

    /// Mention markup used in message content
    pub fn mention_tag(&self) -> String {
        let prefix = if self.animated { "a" } else { "" };
        format!("<{prefix}:{}:{}>", self.name, self.id)
    }

    /// Whitelist compared as a set
    pub fn same_whitelist(&self, other: &CustomEmoji) -> bool {
        let mut a = self.whitelisted_roles.clone();
        let mut b = other.whitelisted_roles.clone();
        a.sort_unstable();
        b.sort_unstable();
        a == b
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_emoji() {
        let emoji = CustomEmoji::decode(
            Snowflake::new(9),
            &json!({
                "id": "41771983429993937",
                "name": "LUL",
                "roles": ["41771983429993000", "41771983429993111"],
                "require_colons": true,
                "managed": false,
                "animated": false
            }),
        )
        .unwrap();

        assert_eq!(emoji.server_id, Snowflake::new(9));
        assert_eq!(emoji.whitelisted_roles.len(), 2);
        assert!(emoji.available);
        assert_eq!(emoji.mention_tag(), "<:LUL:41771983429993937>");
    }

    #[test]
    fn test_whitelist_order_does_not_matter() {
        let a = CustomEmoji::decode(
            Snowflake::new(1),
            &json!({"id": "5", "name": "x", "roles": ["1", "2"]}),
        )
        .unwrap();
        let b = CustomEmoji::decode(
            Snowflake::new(1),
            &json!({"id": "5", "name": "x", "roles": ["2", "1"]}),
        )
        .unwrap();
        assert!(a.same_whitelist(&b));
    }
}
