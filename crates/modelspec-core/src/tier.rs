//! # Conformance Tiers
//!
//! MUST / SHOULD / CAN, analogous to RFC 2119 requirement levels. The tier
//! is attached to each key definition; the validator never branches on
//! key names to decide severity.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ModelSpecError;

/// Requirement level of a registry key.
///
/// Ordered from strongest to weakest, so `Tier::Must < Tier::Can`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Absence means the file pre-dates the standard.
    Must,
    /// Expected on conformant files; absence is informational.
    Should,
    /// Optional.
    Can,
}

impl Tier {
    /// All tiers, strongest first.
    pub fn all() -> &'static [Tier] {
        &[Self::Must, Self::Should, Self::Can]
    }

    /// Lowercase identifier, matching the serde form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Must => "must",
            Self::Should => "should",
            Self::Can => "can",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ModelSpecError;

    /// Case-insensitive; accepts the upper-case forms used in the standard's prose.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "must" => Ok(Self::Must),
            "should" => Ok(Self::Should),
            "can" => Ok(Self::Can),
            _ => Err(ModelSpecError::UnknownTier(s.to_string())),
        }
    }
}
