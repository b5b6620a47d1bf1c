//! Strongly-typed identifiers.

use core::str::FromStr;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a catalog item.
///
/// Opaque and stable. Catalog files carry it either as a JSON number
/// (`"id": 1`) or a string (`"id": "BK-0001"`); both are kept in their textual
/// form so comparisons never depend on the source representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_id("ItemId: empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ItemId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<u64> for ItemId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawItemId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = match RawItemId::deserialize(deserializer)? {
            RawItemId::Text(s) => s,
            RawItemId::Signed(n) => n.to_string(),
            RawItemId::Unsigned(n) => n.to_string(),
        };
        ItemId::new(text).map_err(serde::de::Error::custom)
    }
}

/// Identifier of a scanning session (one process run / one loaded catalog).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

macro_rules! impl_uuid_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

impl_uuid_newtype!(SessionId, "SessionId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_id_accepts_numbers_and_strings() {
        let from_number: ItemId = serde_json::from_str("1").unwrap();
        let from_string: ItemId = serde_json::from_str("\"1\"").unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(from_number.as_str(), "1");

        let negative: ItemId = serde_json::from_str("-4").unwrap();
        assert_eq!(negative.as_str(), "-4");
    }

    #[test]
    fn item_id_rejects_blank() {
        assert!(matches!(ItemId::new("   "), Err(DomainError::InvalidId(_))));
        assert!(serde_json::from_str::<ItemId>("\"\"").is_err());
        assert!(serde_json::from_str::<ItemId>("null").is_err());
    }

    #[test]
    fn session_id_round_trips_through_display() {
        let id = SessionId::new();
        let parsed: SessionId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!(matches!(
            "not-a-uuid".parse::<SessionId>(),
            Err(DomainError::InvalidId(_))
        ));
    }
}
