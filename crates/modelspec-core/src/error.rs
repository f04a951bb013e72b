//! # Error Types
//!
//! Errors raised when user-supplied names (a revision on the command line,
//! a tier in a config file) or hash strings cannot be interpreted.
//!
//! Validation findings are *not* errors. A missing MUST key or a malformed
//! value is recorded in the conformance report; nothing in this crate
//! aborts a validation run.

use thiserror::Error;

/// Top-level error type for ModelSpec primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelSpecError {
    /// A tier name other than `must`, `should` or `can`.
    #[error("unknown tier: {0:?} (expected must, should or can)")]
    UnknownTier(String),

    /// A category name that does not map to a key category.
    #[error("unknown category: {0:?} (expected general, image_generation or text_prediction)")]
    UnknownCategory(String),

    /// A registry revision with no shipped snapshot.
    #[error("unknown registry revision: {0:?}")]
    UnknownRevision(String),

    /// A key name (e.g. in a tier override) that the registry does not define.
    #[error("unknown registry key: {0:?}")]
    UnknownKey(String),

    /// A hash string that is not `0x` followed by lowercase hex.
    #[error("invalid hash digest {value:?}: {reason}")]
    InvalidDigest {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}
