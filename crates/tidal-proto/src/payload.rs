//! Opaque payloads attached to menu items.
//!
//! rofi hands the `info` string of the selected row back to the next
//! invocation through `ROFI_INFO`; that is the only way identifiers survive
//! between two runs.  The short keys match the caches and menus written by
//! the earlier Python script, so old rows keep working.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Catalog identifier.  Tidal hands out numeric ids, but anything that comes
/// back through the launcher is accepted as either a JSON string or number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CatalogId(String);

impl CatalogId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CatalogId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<u64> for CatalogId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for CatalogId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => CatalogId(s),
            Raw::Unsigned(n) => CatalogId(n.to_string()),
            Raw::Signed(n) => CatalogId(n.to_string()),
        })
    }
}

/// What a selected row asks the next invocation to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    /// Play this track.
    Track {
        #[serde(rename = "t")]
        track_id: CatalogId,
        #[serde(rename = "n")]
        name: String,
        #[serde(rename = "a")]
        artist: String,
    },
    /// Show this album's track listing.
    Album {
        #[serde(rename = "view_al")]
        album_id: CatalogId,
        #[serde(rename = "n")]
        name: String,
    },
}

impl Payload {
    /// Decode the raw `ROFI_INFO` text.  Anything that is not one of the two
    /// known shapes yields `None`.
    pub fn decode(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        serde_json::from_str(raw).ok()
    }

    pub fn encode(&self) -> String {
        // Plain structs of strings cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}
