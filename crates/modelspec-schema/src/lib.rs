//! # modelspec-schema — Conformance Validation
//!
//! Checks the `modelspec.*` entries of a `.safetensors` `__metadata__` map
//! against the key registry in `modelspec-core` and produces a
//! [`ConformanceReport`].
//!
//! ## Responsibilities
//!
//! - **Metadata view:** [`MetadataMap`] holds the raw map; spec keys are
//!   read only under their prefixed form.
//! - **Category resolution:** [`CategoryResolver`] picks image-generation,
//!   text-prediction or unknown from marker keys and the architecture.
//! - **Validation:** [`SchemaValidator`] applies GENERAL ∪ category keys
//!   and records presence per tier, format violations, unrecognised keys
//!   and a verdict.
//! - **Configuration:** [`ValidatorConfig`] loads revision choice,
//!   architecture allow-lists and tier overrides from YAML.
//!
//! ## Design
//!
//! Validation never fails. Reading the header off disk is somebody else's
//! job; this crate starts from an already-parsed map.

pub mod config;
pub mod metadata;
pub mod report;
pub mod resolve;
pub mod validate;

// Re-export primary types.
pub use config::{ConfigError, ValidatorConfig};
pub use metadata::{MetadataMap, SpecKeys};
pub use report::{ConformanceReport, FormatViolation, Verdict};
pub use resolve::CategoryResolver;
pub use validate::SchemaValidator;
