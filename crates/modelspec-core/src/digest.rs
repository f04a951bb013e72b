//! # Hash Digests — `0x`-Prefixed Hex
//!
//! The `hash_sha256` key stores a SHA-256 digest of the tensor data region
//! as `0x` followed by lowercase hex. This module owns that textual form:
//! parsing it, rendering it, and producing it from raw bytes.
//!
//! The format check is deliberately narrower than "any hex": uppercase
//! digits are rejected so that two producers hashing the same data always
//! write byte-identical header values.
//!
//! Hashing itself is delegated to the `sha2` crate.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ModelSpecError;

/// Prefix every hash value in a ModelSpec header carries.
pub const HASH_PREFIX: &str = "0x";

/// A validated `0x`-prefixed lowercase hex digest.
///
/// Stores the full textual form so it can be compared directly against
/// header values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HashDigest(String);

impl HashDigest {
    /// Parse a header value such as `0x5f3a…`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelSpecError::InvalidDigest`] when the prefix is missing,
    /// the body is empty, or the body contains anything other than
    /// `[0-9a-f]`.
    pub fn parse(value: &str) -> Result<Self, ModelSpecError> {
        let body = value
            .strip_prefix(HASH_PREFIX)
            .ok_or_else(|| ModelSpecError::InvalidDigest {
                value: value.to_string(),
                reason: "missing 0x prefix".to_string(),
            })?;

        if body.is_empty() {
            return Err(ModelSpecError::InvalidDigest {
                value: value.to_string(),
                reason: "no hex digits after 0x".to_string(),
            });
        }

        if let Some(bad) = body
            .chars()
            .find(|c| !matches!(c, '0'..='9' | 'a'..='f'))
        {
            return Err(ModelSpecError::InvalidDigest {
                value: value.to_string(),
                reason: format!("character {bad:?} is not lowercase hex"),
            });
        }

        Ok(Self(value.to_string()))
    }

    /// Render raw digest bytes in header form.
    pub fn from_digest_bytes(bytes: &[u8]) -> Self {
        let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        Self(format!("{HASH_PREFIX}{hex}"))
    }

    /// The full `0x…` string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The hex digits without the prefix.
    pub fn hex(&self) -> &str {
        &self.0[HASH_PREFIX.len()..]
    }
}

impl std::fmt::Display for HashDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for HashDigest {
    type Error = ModelSpecError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HashDigest> for String {
    fn from(value: HashDigest) -> Self {
        value.0
    }
}

/// Returns true if `value` is `0x` followed by one or more lowercase hex digits.
pub fn is_hash_hex(value: &str) -> bool {
    HashDigest::parse(value).is_ok()
}

/// SHA-256 of `data`, rendered as a `0x`-prefixed header value.
pub fn sha256_prefixed(data: &[u8]) -> HashDigest {
    HashDigest::from_digest_bytes(&Sha256::digest(data))
}
