//! # Conformance Reports
//!
//! One [`ConformanceReport`] is produced per validation run. It is a plain
//! value: the validator builds it, hands it back, and keeps nothing.
//!
//! ## Verdict
//!
//! - `NonConformant` when any MUST key is missing, or a present MUST key
//!   has an error-severity format violation. A missing MUST key means the
//!   file is assumed to pre-date the standard.
//! - `ConformantWithFindings` when every MUST key is present and valid but
//!   other violations or warnings were recorded.
//! - `Conformant` otherwise.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use modelspec_core::{RegistryRevision, ResolvedCategory, Severity, ViolationReason};

/// Overall outcome of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// Every MUST key present and well-formed; nothing else to report.
    Conformant,
    /// MUST keys fine, but other findings were recorded.
    ConformantWithFindings,
    /// A MUST key is missing or malformed.
    NonConformant,
}

impl Verdict {
    /// Returns the SCREAMING_SNAKE_CASE identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conformant => "CONFORMANT",
            Self::ConformantWithFindings => "CONFORMANT_WITH_FINDINGS",
            Self::NonConformant => "NON_CONFORMANT",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A present key whose value failed its format rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatViolation {
    /// Bare key name.
    pub key: String,
    /// The offending value, rendered as text (JSON for non-strings).
    pub value: String,
    /// Reason code.
    pub reason: ViolationReason,
    /// Error or warning.
    pub severity: Severity,
    /// Human-readable detail.
    pub message: String,
    /// For list rules, the offending element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
}

impl fmt::Display for FormatViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  {} [{}] {}: {}",
            self.key, self.severity, self.reason, self.message
        )
    }
}

/// Structured result of validating one metadata map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConformanceReport {
    /// Verbatim value of the version key, if present as a string.
    pub spec_version_detected: Option<String>,
    /// Registry snapshot used for this run.
    pub registry_revision: RegistryRevision,
    /// Category whose keys were applied on top of GENERAL.
    pub resolved_category: ResolvedCategory,
    /// MUST keys absent from the header.
    pub missing_must: BTreeSet<String>,
    /// SHOULD keys absent from the header.
    pub missing_should: BTreeSet<String>,
    /// MUST keys present (possibly malformed).
    pub present_must: BTreeSet<String>,
    /// SHOULD keys present (possibly malformed).
    pub present_should: BTreeSet<String>,
    /// CAN keys present (possibly malformed).
    pub present_can: BTreeSet<String>,
    /// Format findings in registry order.
    pub format_violations: Vec<FormatViolation>,
    /// Prefixed keys with no definition for the resolved category.
    pub unrecognized_keys: BTreeSet<String>,
    /// Keys without the `modelspec.` prefix.
    pub other_key_count: usize,
    /// Overall outcome.
    pub verdict: Verdict,
}

impl ConformanceReport {
    /// True when MUST keys are missing: the file is treated as pre-dating
    /// the standard. This is a policy outcome, not an error.
    pub fn is_pre_spec(&self) -> bool {
        !self.missing_must.is_empty()
    }

    /// True unless the verdict is `NonConformant`.
    pub fn is_conformant(&self) -> bool {
        self.verdict != Verdict::NonConformant
    }

    /// Error-severity violations.
    pub fn errors(&self) -> impl Iterator<Item = &FormatViolation> {
        self.format_violations
            .iter()
            .filter(|v| v.severity == Severity::Error)
    }

    /// Warning-severity violations.
    pub fn warnings(&self) -> impl Iterator<Item = &FormatViolation> {
        self.format_violations
            .iter()
            .filter(|v| v.severity == Severity::Warning)
    }

    /// Compute the verdict from the collected findings.
    pub(crate) fn compute_verdict(&self) -> Verdict {
        let must_malformed = self
            .errors()
            .any(|v| self.present_must.contains(&v.key));
        if self.is_pre_spec() || must_malformed {
            Verdict::NonConformant
        } else if !self.format_violations.is_empty() {
            Verdict::ConformantWithFindings
        } else {
            Verdict::Conformant
        }
    }
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "verdict: {}", self.verdict)?;
        writeln!(
            f,
            "spec version: {} (registry {})",
            self.spec_version_detected.as_deref().unwrap_or("<absent>"),
            self.registry_revision
        )?;
        writeln!(f, "category: {}", self.resolved_category)?;
        if self.is_pre_spec() {
            writeln!(f, "missing MUST: {}", join(&self.missing_must))?;
        }
        if !self.missing_should.is_empty() {
            writeln!(f, "missing SHOULD: {}", join(&self.missing_should))?;
        }
        if !self.present_can.is_empty() {
            writeln!(f, "present CAN: {}", join(&self.present_can))?;
        }
        if !self.unrecognized_keys.is_empty() {
            writeln!(f, "unrecognized: {}", join(&self.unrecognized_keys))?;
        }
        if !self.format_violations.is_empty() {
            writeln!(f, "format findings:")?;
            for v in &self.format_violations {
                writeln!(f, "{v}")?;
            }
        }
        write!(f, "other keys: {}", self.other_key_count)
    }
}

fn join(keys: &BTreeSet<String>) -> String {
    keys.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
