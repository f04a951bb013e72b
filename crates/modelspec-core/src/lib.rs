//! # modelspec-core — Foundational Types for ModelSpec Conformance
//!
//! This crate holds everything the conformance validator needs to know
//! about the ModelSpec standard itself, with no I/O and no knowledge of
//! how a `.safetensors` header was obtained.
//!
//! ## Key Design Principles
//!
//! 1. **One tier enum, one category enum.** `Tier` (MUST/SHOULD/CAN) is a
//!    field on every key definition, so a single validation loop handles
//!    every requirement level. `Category` composes: GENERAL keys always
//!    apply, category keys apply only when the resolver picks them.
//!
//! 2. **Registry as data.** Key names, tiers and format rules live in
//!    versioned snapshots ([`RegistryRevision`]). The two published
//!    revisions disagree on the version key name and on the tier of
//!    `resolution`; both are data, neither is hard-coded.
//!
//! 3. **Checkers are pure predicates.** Every [`FormatRule`] returns a
//!    [`Finding`] or nothing. Open enumerations downgrade unlisted values
//!    to warnings instead of rejecting them.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `modelspec-*` crates (leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod category;
pub mod digest;
pub mod error;
pub mod format;
pub mod registry;
pub mod temporal;
pub mod tier;

// Re-export primary types for ergonomic imports.
pub use category::{Category, ResolvedCategory};
pub use digest::{sha256_prefixed, HashDigest};
pub use error::ModelSpecError;
pub use format::{Finding, FormatRule, Pattern, Severity, ViolationReason};
pub use registry::{KeyDefinition, Registry, RegistryRevision, MODELSPEC_PREFIX};
pub use temporal::is_iso8601_date;
pub use tier::Tier;
