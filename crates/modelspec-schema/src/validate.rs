//! # Conformance Validation
//!
//! [`SchemaValidator::validate`] turns one metadata map into one
//! [`ConformanceReport`]. It never fails: every problem with the header is
//! a finding in the report, and missing MUST keys are treated as "this
//! file pre-dates the standard" rather than as an error.
//!
//! ## Run
//!
//! 1. Strip the `modelspec.` prefix. Bare keys are not spec keys.
//! 2. Pick the registry revision: forced, else detected from the version
//!    key in the header, else the configured default.
//! 3. Resolve the category.
//! 4. Walk GENERAL ∪ category keys in registry order, recording presence
//!    per tier and running each present value through its format rule.
//! 5. Any other prefixed key is unrecognised. Keys defined only for a
//!    different category land here too and are never format-checked.

use std::borrow::Cow;

use serde_json::Value;

use modelspec_core::{Finding, Registry, RegistryRevision, Tier, ViolationReason};

use crate::config::{ConfigError, ValidatorConfig};
use crate::metadata::{MetadataMap, SpecKeys};
use crate::report::{ConformanceReport, FormatViolation, Verdict};
use crate::resolve::CategoryResolver;

/// Validates metadata maps against the key registry.
///
/// Holds no per-run state; one instance can validate any number of maps,
/// from any number of threads.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    forced_revision: Option<RegistryRevision>,
    default_revision: RegistryRevision,
    v1_0_0: Cow<'static, Registry>,
    v1_0_1: Cow<'static, Registry>,
    resolver: CategoryResolver,
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self {
            forced_revision: None,
            default_revision: RegistryRevision::default(),
            v1_0_0: Cow::Borrowed(Registry::snapshot(RegistryRevision::V1_0_0)),
            v1_0_1: Cow::Borrowed(Registry::snapshot(RegistryRevision::V1_0_1)),
            resolver: CategoryResolver::default(),
        }
    }
}

impl SchemaValidator {
    /// Validator with shipped snapshots, revision detection and default
    /// architecture lists.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a validator from a loaded config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] if a tier override names a
    /// key that no revision defines.
    pub fn from_config(config: &ValidatorConfig) -> Result<Self, ConfigError> {
        let v1_0_0 = apply_overrides(RegistryRevision::V1_0_0, config)?;
        let v1_0_1 = apply_overrides(RegistryRevision::V1_0_1, config)?;
        Ok(Self {
            forced_revision: config.revision,
            default_revision: config.default_revision,
            v1_0_0,
            v1_0_1,
            resolver: CategoryResolver::new(
                config.image_architectures.iter().cloned(),
                config.text_architectures.iter().cloned(),
            ),
        })
    }

    /// Force one revision for every map, or `None` to detect per map.
    pub fn with_revision(mut self, revision: Option<RegistryRevision>) -> Self {
        self.forced_revision = revision;
        self
    }

    /// Replace the category resolver.
    pub fn with_resolver(mut self, resolver: CategoryResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// The registry used for `revision`, overrides applied.
    pub fn registry(&self, revision: RegistryRevision) -> &Registry {
        match revision {
            RegistryRevision::V1_0_0 => &self.v1_0_0,
            RegistryRevision::V1_0_1 => &self.v1_0_1,
        }
    }

    /// The category resolver in use.
    pub fn resolver(&self) -> &CategoryResolver {
        &self.resolver
    }

    /// Pick the revision for one header.
    pub fn select_revision(&self, spec: &SpecKeys<'_>) -> RegistryRevision {
        if let Some(forced) = self.forced_revision {
            return forced;
        }
        RegistryRevision::all()
            .iter()
            .copied()
            .find(|rev| spec.contains(rev.version_key()))
            .unwrap_or(self.default_revision)
    }

    /// Validate one metadata map.
    pub fn validate(&self, map: &MetadataMap) -> ConformanceReport {
        let spec = map.spec_keys();
        let revision = self.select_revision(&spec);
        let registry = self.registry(revision);
        let category = self.resolver.resolve(&spec);

        let spec_version_detected = spec
            .get_str(registry.version_key())
            .or_else(|| {
                RegistryRevision::all()
                    .iter()
                    .find_map(|rev| spec.get_str(rev.version_key()))
            })
            .map(str::to_string);

        let mut report = ConformanceReport {
            spec_version_detected,
            registry_revision: revision,
            resolved_category: category,
            missing_must: Default::default(),
            missing_should: Default::default(),
            present_must: Default::default(),
            present_should: Default::default(),
            present_can: Default::default(),
            format_violations: Vec::new(),
            unrecognized_keys: Default::default(),
            other_key_count: spec.other_key_count(),
            verdict: Verdict::Conformant,
        };

        for def in registry.keys_for(category) {
            let name = def.name.to_string();
            let Some(value) = spec.get(def.name) else {
                match def.tier {
                    Tier::Must => {
                        report.missing_must.insert(name);
                    }
                    Tier::Should => {
                        report.missing_should.insert(name);
                    }
                    Tier::Can => {}
                }
                continue;
            };

            let finding = match value {
                Value::String(text) => def.format.and_then(|rule| rule.check(text).err()),
                other => Some(Finding::error(
                    ViolationReason::NotAString,
                    format!("expected a string, found {}", json_type(other)),
                )),
            };
            if let Some(finding) = finding {
                tracing::trace!(
                    key = def.name,
                    reason = %finding.reason,
                    severity = %finding.severity,
                    "format violation"
                );
                report.format_violations.push(FormatViolation {
                    key: name.clone(),
                    value: render_value(value),
                    reason: finding.reason,
                    severity: finding.severity,
                    message: finding.message,
                    element: finding.element,
                });
            }

            match def.tier {
                Tier::Must => report.present_must.insert(name),
                Tier::Should => report.present_should.insert(name),
                Tier::Can => report.present_can.insert(name),
            };
        }

        for (name, _) in spec.iter() {
            if registry.lookup_for(name, category).is_none() {
                report.unrecognized_keys.insert(name.to_string());
            }
        }

        report.verdict = report.compute_verdict();
        tracing::debug!(
            revision = %revision,
            category = %category,
            missing_must = report.missing_must.len(),
            violations = report.format_violations.len(),
            verdict = %report.verdict,
            "validated metadata"
        );
        report
    }
}

fn apply_overrides(
    revision: RegistryRevision,
    config: &ValidatorConfig,
) -> Result<Cow<'static, Registry>, ConfigError> {
    let snapshot = Registry::snapshot(revision);
    if config.tier_overrides.is_empty() {
        return Ok(Cow::Borrowed(snapshot));
    }
    // The version key differs between revisions; an override of one is
    // ignored for the other.
    let overrides = config
        .tier_overrides
        .iter()
        .filter(|(name, _)| {
            snapshot.lookup(name).is_some() || RegistryRevision::for_version_key(name).is_none()
        })
        .map(|(name, tier)| (name.clone(), *tier))
        .collect();
    Ok(Cow::Owned(snapshot.with_tier_overrides(&overrides)?))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelspec_core::{ResolvedCategory, Severity};
    use serde_json::json;

    fn complete_image_map() -> MetadataMap {
        MetadataMap::from([
            ("modelspec.sai_model_spec", "1.0.0"),
            ("modelspec.architecture", "stable-diffusion-xl-v1-base"),
            ("modelspec.implementation", "https://github.com/Stability-AI/generative-models"),
            ("modelspec.title", "Example"),
            ("modelspec.resolution", "1024x1024"),
        ])
    }

    #[test]
    fn detects_revision_from_version_key() {
        let v = SchemaValidator::new();
        let old = MetadataMap::from([("modelspec.sai_model_spec", "1.0.0")]);
        let new = MetadataMap::from([("modelspec.version", "1.0.1")]);
        let none = MetadataMap::new();
        assert_eq!(v.select_revision(&old.spec_keys()), RegistryRevision::V1_0_0);
        assert_eq!(v.select_revision(&new.spec_keys()), RegistryRevision::V1_0_1);
        assert_eq!(v.select_revision(&none.spec_keys()), RegistryRevision::V1_0_0);
    }

    #[test]
    fn forced_revision_wins_over_detection() {
        let v = SchemaValidator::new().with_revision(Some(RegistryRevision::V1_0_1));
        let report = v.validate(&complete_image_map());
        assert_eq!(report.registry_revision, RegistryRevision::V1_0_1);
        assert!(report.missing_must.contains("version"));
        assert!(report.unrecognized_keys.contains("sai_model_spec"));
        assert_eq!(report.spec_version_detected.as_deref(), Some("1.0.0"));
    }

    #[test]
    fn complete_image_header_is_conformant() {
        let report = SchemaValidator::new().validate(&complete_image_map());
        assert_eq!(report.resolved_category, ResolvedCategory::ImageGeneration);
        assert!(report.missing_must.is_empty());
        assert!(report.format_violations.is_empty());
        assert_eq!(report.verdict, Verdict::Conformant);
        assert!(report.present_should.contains("resolution"));
        assert!(report.missing_should.contains("author"));
    }

    #[test]
    fn non_string_value_counts_as_present() {
        let mut map = complete_image_map();
        map.insert("modelspec.encoder_layer", json!(2));
        let report = SchemaValidator::new().validate(&map);
        assert!(report.present_can.contains("encoder_layer"));
        let violation = &report.format_violations[0];
        assert_eq!(violation.key, "encoder_layer");
        assert_eq!(violation.reason, ViolationReason::NotAString);
        assert_eq!(violation.value, "2");
        assert_eq!(report.verdict, Verdict::ConformantWithFindings);
    }

    #[test]
    fn non_string_must_key_is_non_conformant() {
        let mut map = complete_image_map();
        map.insert("modelspec.title", json!(null));
        let report = SchemaValidator::new().validate(&map);
        assert!(report.missing_must.is_empty());
        assert!(report.present_must.contains("title"));
        assert_eq!(report.verdict, Verdict::NonConformant);
    }

    #[test]
    fn unlisted_open_enum_value_is_a_warning() {
        let mut map = complete_image_map();
        map.insert("modelspec.prediction_type", "flow");
        let report = SchemaValidator::new().validate(&map);
        assert_eq!(report.warnings().count(), 1);
        assert_eq!(report.errors().count(), 0);
        assert_eq!(report.format_violations[0].severity, Severity::Warning);
        assert_eq!(report.verdict, Verdict::ConformantWithFindings);
    }

    #[test]
    fn other_category_keys_are_unrecognized_not_checked() {
        let mut map = complete_image_map();
        map.insert("modelspec.format_type", "not-a-known-format");
        map.insert("modelspec.custom_field", "anything");
        let report = SchemaValidator::new().validate(&map);
        assert!(report.unrecognized_keys.contains("format_type"));
        assert!(report.unrecognized_keys.contains("custom_field"));
        assert!(report.format_violations.is_empty());
        assert_eq!(report.verdict, Verdict::Conformant);
    }

    #[test]
    fn other_keys_are_counted() {
        let mut map = complete_image_map();
        map.insert("ss_network_dim", "32");
        map.insert("format", "pt");
        assert_eq!(SchemaValidator::new().validate(&map).other_key_count, 2);
    }

    #[test]
    fn config_overrides_tiers_and_allow_lists() {
        let config = ValidatorConfig::from_yaml_str(
            "text_architectures: [qwen]\ntier_overrides:\n  author: must\n",
        )
        .unwrap();
        let v = SchemaValidator::from_config(&config).unwrap();
        let map = MetadataMap::from([("modelspec.architecture", "qwen2-7b")]);
        let report = v.validate(&map);
        assert_eq!(report.resolved_category, ResolvedCategory::TextPrediction);
        assert!(report.missing_must.contains("author"));
    }

    #[test]
    fn version_key_override_applies_to_its_revision_only() {
        let config =
            ValidatorConfig::from_yaml_str("tier_overrides:\n  version: should\n").unwrap();
        let v = SchemaValidator::from_config(&config).unwrap();
        assert_eq!(
            v.registry(RegistryRevision::V1_0_1).lookup("version").unwrap().tier,
            Tier::Should
        );
        assert!(v.registry(RegistryRevision::V1_0_0).lookup("version").is_none());
    }

    #[test]
    fn config_with_unknown_override_key_fails() {
        let config = ValidatorConfig::from_yaml_str("tier_overrides:\n  colour: must\n").unwrap();
        let err = SchemaValidator::from_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOverride(_)));
    }

    #[test]
    fn validator_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SchemaValidator>();
    }
}
