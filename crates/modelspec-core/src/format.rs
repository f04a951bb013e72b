//! # Value Format Checkers
//!
//! Each registry key may carry a [`FormatRule`]. A rule is a pure predicate
//! over the header value: it returns `Ok(())` or a [`Finding`] describing
//! why the value is malformed and how severe that is.
//!
//! ## Open enumerations
//!
//! Some enumerations (`format_type`, `prediction_type`) are explicitly open:
//! the standard expects future values nobody has listed yet. For those an
//! unlisted value is a [`Severity::Warning`] with reason
//! [`ViolationReason::UnlistedValue`], never an error. Closed enumerations
//! (`is_negative_embedding`) report [`ViolationReason::UnknownValue`] as an
//! error.
//!
//! ## Patterns
//!
//! Regex rules reference a `static` [`Pattern`]. The regex is compiled on
//! first use and cached for the life of the process; after that the
//! pattern is read-only, so checks from many threads never contend.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::digest::is_hash_hex;
use crate::temporal::parse_iso8601;

/// How much a finding matters to the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The value does not satisfy its rule.
    Error,
    /// The value is permitted but not recognised (open enumerations).
    Warning,
}

impl Severity {
    /// Returns the snake_case identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Machine-readable reason code for a malformed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationReason {
    /// The header carried a non-string JSON value for a spec key.
    NotAString,
    /// Not `<digits>x<digits>`.
    MalformedDimensions,
    /// Not `0x` followed by lowercase hex.
    MalformedHash,
    /// Not an ISO-8601 date or date-time.
    MalformedDate,
    /// An element of a comma-separated list failed its element rule.
    MalformedListElement,
    /// Value outside a closed enumeration.
    UnknownValue,
    /// Value outside an open enumeration; permitted.
    UnlistedValue,
    /// Value does not match the key's pattern.
    PatternMismatch,
    /// The registry's own pattern failed to compile.
    InvalidPattern,
}

impl ViolationReason {
    /// Returns the SCREAMING_SNAKE_CASE reason code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotAString => "NOT_A_STRING",
            Self::MalformedDimensions => "MALFORMED_DIMENSIONS",
            Self::MalformedHash => "MALFORMED_HASH",
            Self::MalformedDate => "MALFORMED_DATE",
            Self::MalformedListElement => "MALFORMED_LIST_ELEMENT",
            Self::UnknownValue => "UNKNOWN_VALUE",
            Self::UnlistedValue => "UNLISTED_VALUE",
            Self::PatternMismatch => "PATTERN_MISMATCH",
            Self::InvalidPattern => "INVALID_PATTERN",
        }
    }
}

impl std::fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single checker result for a value that did not pass cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Reason code.
    pub reason: ViolationReason,
    /// Error or warning.
    pub severity: Severity,
    /// Human-readable explanation.
    pub message: String,
    /// For list rules, the offending element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
}

impl Finding {
    /// An error-severity finding.
    pub fn error(reason: ViolationReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            severity: Severity::Error,
            message: message.into(),
            element: None,
        }
    }

    /// A warning-severity finding.
    pub fn warning(reason: ViolationReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            severity: Severity::Warning,
            message: message.into(),
            element: None,
        }
    }

    /// Whether this finding counts against conformance.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// A named regular expression used by [`FormatRule::Regex`].
#[derive(Debug)]
pub struct Pattern {
    source: &'static str,
    description: &'static str,
    compiled: OnceLock<Option<Regex>>,
}

impl Pattern {
    /// Declare a pattern. Compilation is deferred to first use.
    pub const fn new(source: &'static str, description: &'static str) -> Self {
        Self {
            source,
            description,
            compiled: OnceLock::new(),
        }
    }

    /// The regex source.
    pub fn source(&self) -> &'static str {
        self.source
    }

    /// What a matching value looks like, in words.
    pub fn description(&self) -> &'static str {
        self.description
    }

    /// The compiled regex, or `None` if the source is not a valid regex.
    fn regex(&self) -> Option<&Regex> {
        self.compiled
            .get_or_init(|| Regex::new(self.source).ok())
            .as_ref()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

/// Value format rule attached to a registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatRule {
    /// Any string.
    FreeText,
    /// Exact membership in `values`. `open` enumerations warn instead of fail.
    EnumOf {
        /// The listed values.
        values: &'static [&'static str],
        /// Whether unlisted values are permitted.
        open: bool,
    },
    /// Must match the pattern.
    Regex(&'static Pattern),
    /// Comma-separated list; each trimmed element must satisfy the inner rule.
    CommaList(&'static FormatRule),
    /// `<width>x<height>` in ASCII digits.
    DimensionPair,
    /// `0x` followed by lowercase hex.
    HashHex,
    /// ISO-8601 date or date-time.
    Iso8601Date,
}

impl FormatRule {
    /// Check `value` against this rule.
    ///
    /// # Errors
    ///
    /// Returns the [`Finding`] describing the first problem. For
    /// [`FormatRule::CommaList`], error-severity element findings take
    /// precedence over warnings.
    pub fn check(&self, value: &str) -> Result<(), Finding> {
        match self {
            Self::FreeText => Ok(()),
            Self::EnumOf { values, open } => check_enum(value, values, *open),
            Self::Regex(pattern) => check_pattern(value, pattern),
            Self::CommaList(inner) => check_list(value, inner),
            Self::DimensionPair => {
                if is_dimension_pair(value) {
                    Ok(())
                } else {
                    Err(Finding::error(
                        ViolationReason::MalformedDimensions,
                        format!("{value:?} is not <width>x<height>"),
                    ))
                }
            }
            Self::HashHex => {
                if is_hash_hex(value) {
                    Ok(())
                } else {
                    Err(Finding::error(
                        ViolationReason::MalformedHash,
                        format!("{value:?} is not 0x followed by lowercase hex"),
                    ))
                }
            }
            Self::Iso8601Date => parse_iso8601(value)
                .map(|_| ())
                .map_err(|reason| Finding::error(ViolationReason::MalformedDate, reason)),
        }
    }

    /// Short description for registry listings.
    pub fn describe(&self) -> String {
        match self {
            Self::FreeText => "free text".to_string(),
            Self::EnumOf { values, open } => {
                let kind = if *open { "open" } else { "one of" };
                format!("{kind} {{{}}}", values.join(", "))
            }
            Self::Regex(pattern) => pattern.description().to_string(),
            Self::CommaList(inner) => format!("comma list of {}", inner.describe()),
            Self::DimensionPair => "<width>x<height>".to_string(),
            Self::HashHex => "0x + lowercase hex".to_string(),
            Self::Iso8601Date => "ISO-8601 date".to_string(),
        }
    }
}

fn check_enum(value: &str, values: &[&str], open: bool) -> Result<(), Finding> {
    if values.contains(&value) {
        return Ok(());
    }
    if open {
        Err(Finding::warning(
            ViolationReason::UnlistedValue,
            format!("{value:?} is not a listed value (permitted: list is open)"),
        ))
    } else {
        Err(Finding::error(
            ViolationReason::UnknownValue,
            format!("{value:?} is not one of {}", values.join(", ")),
        ))
    }
}

fn check_pattern(value: &str, pattern: &Pattern) -> Result<(), Finding> {
    match pattern.regex() {
        Some(re) if re.is_match(value) => Ok(()),
        Some(_) => Err(Finding::error(
            ViolationReason::PatternMismatch,
            format!("{value:?} does not match: {}", pattern.description()),
        )),
        None => Err(Finding::error(
            ViolationReason::InvalidPattern,
            format!("registry pattern {:?} does not compile", pattern.source()),
        )),
    }
}

fn check_list(value: &str, inner: &FormatRule) -> Result<(), Finding> {
    if value.trim().is_empty() {
        return Ok(());
    }

    let mut first_warning: Option<Finding> = None;
    for element in value.split(',').map(str::trim) {
        let outcome = if element.is_empty() {
            Err(Finding::error(
                ViolationReason::MalformedListElement,
                "empty element",
            ))
        } else {
            inner.check(element)
        };

        if let Err(found) = outcome {
            let wrapped = Finding {
                reason: ViolationReason::MalformedListElement,
                severity: found.severity,
                message: format!("element {element:?}: {}", found.message),
                element: Some(element.to_string()),
            };
            if wrapped.is_error() {
                return Err(wrapped);
            }
            first_warning.get_or_insert(wrapped);
        }
    }

    match first_warning {
        Some(w) => Err(w),
        None => Ok(()),
    }
}

/// `^\d+x\d+$` over ASCII digits.
fn is_dimension_pair(value: &str) -> bool {
    let Some((w, h)) = value.split_once('x') else {
        return false;
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    digits(w) && digits(h)
}
