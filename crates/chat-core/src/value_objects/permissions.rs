//! Permission bitflags carried by roles
//!
//! Bit positions follow the platform's REST/gateway representation, where the value is
//! sent as a decimal string.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

bitflags! {
    /// Role permission flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u64 {
        const CREATE_INSTANT_INVITE      = 1 << 0;
        const KICK_MEMBERS               = 1 << 1;
        const BAN_MEMBERS                = 1 << 2;
        /// Bypass all permission checks
        const ADMINISTRATOR              = 1 << 3;
        const MANAGE_CHANNELS            = 1 << 4;
        const MANAGE_GUILD               = 1 << 5;
        const ADD_REACTIONS              = 1 << 6;
        const VIEW_AUDIT_LOG             = 1 << 7;
        const PRIORITY_SPEAKER           = 1 << 8;
        const STREAM                     = 1 << 9;
        const VIEW_CHANNEL               = 1 << 10;
        const SEND_MESSAGES              = 1 << 11;
        const SEND_TTS_MESSAGES          = 1 << 12;
        const MANAGE_MESSAGES            = 1 << 13;
        const EMBED_LINKS                = 1 << 14;
        const ATTACH_FILES               = 1 << 15;
        const READ_MESSAGE_HISTORY       = 1 << 16;
        const MENTION_EVERYONE           = 1 << 17;
        const USE_EXTERNAL_EMOJIS        = 1 << 18;
        const VIEW_GUILD_INSIGHTS        = 1 << 19;
        const CONNECT                    = 1 << 20;
        const SPEAK                      = 1 << 21;
        const MUTE_MEMBERS               = 1 << 22;
        const DEAFEN_MEMBERS             = 1 << 23;
        const MOVE_MEMBERS               = 1 << 24;
        const USE_VAD                    = 1 << 25;
        const CHANGE_NICKNAME            = 1 << 26;
        const MANAGE_NICKNAMES           = 1 << 27;
        const MANAGE_ROLES               = 1 << 28;
        const MANAGE_WEBHOOKS            = 1 << 29;
        const MANAGE_EMOJIS_AND_STICKERS = 1 << 30;
        const USE_APPLICATION_COMMANDS   = 1 << 31;
        const MODERATE_MEMBERS           = 1 << 40;

        // Bits the client does not name yet must survive a decode/encode cycle
        const _ = !0;
    }
}

impl Permissions {
    /// Check if the permission set contains a required permission
    ///
    /// Administrators bypass all permission checks.
    #[inline]
    pub fn has(&self, permission: Permissions) -> bool {
        self.contains(Permissions::ADMINISTRATOR) || self.contains(permission)
    }

    /// Combine permissions from multiple roles
    pub fn combine<I>(roles: I) -> Self
    where
        I: IntoIterator<Item = Permissions>,
    {
        roles.into_iter().fold(Permissions::empty(), |acc, p| acc | p)
    }

    /// Parse from string representation (decimal number)
    pub fn parse(s: &str) -> Result<Self, std::num::ParseIntError> {
        s.parse::<u64>().map(Permissions::from_bits_retain)
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Permissions::empty()
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

impl Serialize for Permissions {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.bits().to_string())
    }
}

// Deserialize from string or number
impl<'de> Deserialize<'de> for Permissions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct PermissionsVisitor;

        impl Visitor<'_> for PermissionsVisitor {
            type Value = Permissions;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer representing permission bits")
            }

            fn visit_u64<E>(self, value: u64) -> Result<Permissions, E>
            where
                E: de::Error,
            {
                Ok(Permissions::from_bits_retain(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Permissions, E>
            where
                E: de::Error,
            {
                Ok(Permissions::from_bits_retain(value as u64))
            }

            fn visit_str<E>(self, value: &str) -> Result<Permissions, E>
            where
                E: de::Error,
            {
                Permissions::parse(value).map_err(|_| de::Error::custom("invalid permissions string"))
            }
        }

        deserializer.deserialize_any(PermissionsVisitor)
    }
}

impl From<u64> for Permissions {
    fn from(bits: u64) -> Self {
        Permissions::from_bits_retain(bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_administrator_bypass() {
        let admin = Permissions::ADMINISTRATOR;
        assert!(admin.has(Permissions::BAN_MEMBERS));
        assert!(admin.has(Permissions::MANAGE_GUILD));

        let member = Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES;
        assert!(member.has(Permissions::SEND_MESSAGES));
        assert!(!member.has(Permissions::BAN_MEMBERS));
    }

    #[test]
    fn test_combine() {
        let combined = Permissions::combine([Permissions::KICK_MEMBERS, Permissions::SPEAK]);
        assert!(combined.contains(Permissions::KICK_MEMBERS | Permissions::SPEAK));
    }

    #[test]
    fn test_string_wire_format() {
        let perms: Permissions = serde_json::from_str("\"2048\"").unwrap();
        assert_eq!(perms, Permissions::SEND_MESSAGES);
        assert_eq!(serde_json::to_string(&perms).unwrap(), "\"2048\"");
    }

    #[test]
    fn test_unknown_bits_are_kept() {
        let raw = (1u64 << 50) | Permissions::SPEAK.bits();
        let perms: Permissions = serde_json::from_str(&format!("\"{raw}\"")).unwrap();
        assert_eq!(perms.bits(), raw);
    }
}
