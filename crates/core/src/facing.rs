//! Camera facing selector.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_object::ValueObject;

/// Which physical camera a stream is requested from.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    /// Back camera (pointing away from the user).
    #[default]
    Environment,
    /// Front camera (pointing at the user).
    User,
}

impl Facing {
    /// The other camera.
    pub fn toggled(self) -> Self {
        match self {
            Facing::Environment => Facing::User,
            Facing::User => Facing::Environment,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Facing::Environment => "environment",
            Facing::User => "user",
        }
    }
}

impl ValueObject for Facing {}

impl core::fmt::Display for Facing {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Facing {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "environment" | "back" | "rear" => Ok(Facing::Environment),
            "user" | "front" => Ok(Facing::User),
            other => Err(DomainError::validation(format!(
                "unknown camera facing '{other}' (expected environment or user)"
            ))),
        }
    }
}
