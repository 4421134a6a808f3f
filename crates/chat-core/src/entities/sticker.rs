//! Server sticker entity

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DomainResult;
use crate::value_objects::Snowflake;

/// Sticker image format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum StickerFormat {
    Png,
    Apng,
    Lottie,
    Gif,
    Unknown(u8),
}

impl From<u8> for StickerFormat {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Png,
            2 => Self::Apng,
            3 => Self::Lottie,
            4 => Self::Gif,
            other => Self::Unknown(other),
        }
    }
}

impl From<StickerFormat> for u8 {
    fn from(format: StickerFormat) -> Self {
        match format {
            StickerFormat::Png => 1,
            StickerFormat::Apng => 2,
            StickerFormat::Lottie => 3,
            StickerFormat::Gif => 4,
            StickerFormat::Unknown(other) => other,
        }
    }
}

/// Sticker uploaded to a server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sticker {
    pub id: Snowflake,
    #[serde(default, rename = "guild_id")]
    pub server_id: Snowflake,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Autocomplete keywords, comma separated
    #[serde(default)]
    pub tags: String,
    #[serde(rename = "format_type")]
    pub format: StickerFormat,
}

impl Sticker {
    /// Decode a sticker payload; a missing `guild_id` falls back to `server_id`
    pub fn decode(server_id: Snowflake, value: &Value) -> DomainResult<Self> {
        let sticker: Sticker = super::decode(value)?;
        if sticker.server_id.is_zero() {
            Ok(Self { server_id, ..sticker })
        } else {
            Ok(sticker)
        }
    }
}
