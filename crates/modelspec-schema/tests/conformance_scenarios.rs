//! Integration tests: end-to-end conformance scenarios over metadata maps
//! shaped like real `.safetensors` headers.

use std::collections::BTreeSet;

use modelspec_core::{RegistryRevision, ResolvedCategory, ViolationReason};
use modelspec_schema::{MetadataMap, SchemaValidator, Verdict};
use proptest::prelude::*;
use serde_json::json;

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_empty_map_is_unknown_with_all_general_must_missing() {
    let report = SchemaValidator::new().validate(&MetadataMap::new());
    assert_eq!(report.resolved_category, ResolvedCategory::Unknown);
    assert_eq!(report.registry_revision, RegistryRevision::V1_0_0);
    assert_eq!(
        report.missing_must,
        set(&["sai_model_spec", "architecture", "implementation", "title"])
    );
    assert!(report.is_pre_spec());
    assert_eq!(report.verdict, Verdict::NonConformant);
    assert_eq!(report.spec_version_detected, None);
}

#[test]
fn test_missing_general_must_keys_are_reported_exactly() {
    let map = MetadataMap::from([
        ("modelspec.sai_model_spec", "1.0.0"),
        ("modelspec.title", "Only a title"),
    ]);
    let report = SchemaValidator::new().validate(&map);
    assert_eq!(report.missing_must, set(&["architecture", "implementation"]));
    assert_eq!(report.present_must, set(&["sai_model_spec", "title"]));
}

#[test]
fn test_all_general_must_present_without_category_keys() {
    let map = MetadataMap::from([
        ("modelspec.sai_model_spec", "1.0.0"),
        ("modelspec.architecture", "my-custom-arch"),
        ("modelspec.implementation", "https://example.com/impl"),
        ("modelspec.title", "Custom"),
    ]);
    let report = SchemaValidator::new().validate(&map);
    assert_eq!(report.resolved_category, ResolvedCategory::Unknown);
    assert!(report.missing_must.is_empty());
    assert_eq!(report.verdict, Verdict::Conformant);
}

#[test]
fn test_sdxl_header_missing_implementation_under_each_revision() {
    let pairs = [
        ("modelspec.sai_model_spec", "1.0.0"),
        ("modelspec.architecture", "stable-diffusion-xl-v1-base"),
        ("modelspec.title", "Example"),
    ];

    let detected = SchemaValidator::new().validate(&MetadataMap::from(pairs));
    assert_eq!(detected.registry_revision, RegistryRevision::V1_0_0);
    assert_eq!(detected.resolved_category, ResolvedCategory::ImageGeneration);
    assert_eq!(detected.missing_must, set(&["implementation"]));
    assert!(detected.missing_should.contains("resolution"));
    assert_eq!(detected.spec_version_detected.as_deref(), Some("1.0.0"));

    let forced = SchemaValidator::new()
        .with_revision(Some(RegistryRevision::V1_0_1))
        .validate(&MetadataMap::from(pairs));
    assert!(forced.missing_must.contains("implementation"));
    assert!(forced.missing_must.contains("resolution"));
    assert!(!forced.missing_should.contains("resolution"));
}

#[test]
fn test_version_key_selects_newer_revision() {
    let map = MetadataMap::from([
        ("modelspec.version", "1.0.1"),
        ("modelspec.architecture", "stable-diffusion-v1"),
        ("modelspec.implementation", "sgm"),
        ("modelspec.title", "SD"),
    ]);
    let report = SchemaValidator::new().validate(&map);
    assert_eq!(report.registry_revision, RegistryRevision::V1_0_1);
    assert_eq!(report.missing_must, set(&["resolution"]));
    assert_eq!(report.spec_version_detected.as_deref(), Some("1.0.1"));
}

#[test]
fn test_text_model_does_not_check_image_keys() {
    let map = MetadataMap::from([
        ("modelspec.sai_model_spec", "1.0.0"),
        ("modelspec.architecture", "gpt-neo-x"),
        ("modelspec.implementation", "transformers"),
        ("modelspec.title", "Neo"),
        ("modelspec.data_format", "fp16"),
        ("modelspec.is_negative_embedding", "maybe"),
    ]);
    let report = SchemaValidator::new().validate(&map);
    assert_eq!(report.resolved_category, ResolvedCategory::TextPrediction);
    assert!(!report.missing_should.contains("resolution"));
    assert!(report.missing_should.contains("format_type"));
    assert!(report.unrecognized_keys.contains("is_negative_embedding"));
    assert!(report.format_violations.is_empty());
}

#[test]
fn test_malformed_values_are_reported_with_reasons() {
    let map = MetadataMap::from([
        ("modelspec.sai_model_spec", "1.0.0"),
        ("modelspec.architecture", "stable-diffusion-xl-v1-base"),
        ("modelspec.implementation", "sgm"),
        ("modelspec.title", "Example"),
        ("modelspec.resolution", "1024×1024"),
        ("modelspec.hash_sha256", "0x5F3A"),
        ("modelspec.date", "2023-02-30"),
        ("modelspec.tags", "anime, , portrait"),
    ]);
    let report = SchemaValidator::new().validate(&map);
    let reasons: Vec<(String, ViolationReason)> = report
        .format_violations
        .iter()
        .map(|v| (v.key.clone(), v.reason))
        .collect();
    assert!(reasons.contains(&("resolution".to_string(), ViolationReason::MalformedDimensions)));
    assert!(reasons.contains(&("hash_sha256".to_string(), ViolationReason::MalformedHash)));
    assert!(reasons.contains(&("date".to_string(), ViolationReason::MalformedDate)));
    assert!(reasons.contains(&("tags".to_string(), ViolationReason::MalformedListElement)));
    assert_eq!(report.verdict, Verdict::ConformantWithFindings);
    assert!(report.present_should.contains("resolution"));
}

#[test]
fn test_report_serializes_to_json() {
    let map = MetadataMap::from_json_value(json!({
        "modelspec.sai_model_spec": "1.0.0",
        "modelspec.architecture": "stable-diffusion-v1",
        "modelspec.encoder_layer": 2,
    }))
    .unwrap();
    let report = SchemaValidator::new().validate(&map);
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["verdict"], "NON_CONFORMANT");
    assert_eq!(value["registry_revision"], "1.0.0");
    assert_eq!(value["resolved_category"], "image_generation");
    assert_eq!(value["format_violations"][0]["reason"], "NOT_A_STRING");
}

fn metadata_strategy() -> impl Strategy<Value = MetadataMap> {
    let key = prop_oneof![
        Just("modelspec.sai_model_spec".to_string()),
        Just("modelspec.version".to_string()),
        Just("modelspec.architecture".to_string()),
        Just("modelspec.resolution".to_string()),
        Just("modelspec.data_format".to_string()),
        Just("modelspec.tags".to_string()),
        Just("modelspec.date".to_string()),
        "modelspec\\.[a-z_]{1,12}",
        "[a-z_.]{1,16}",
    ];
    prop::collection::btree_map(key, ".{0,32}", 0..12)
        .prop_map(|pairs| pairs.into_iter().collect::<MetadataMap>())
}

proptest! {
    #[test]
    fn validate_never_panics(map in metadata_strategy()) {
        let _ = SchemaValidator::new().validate(&map);
    }

    #[test]
    fn validate_is_idempotent(map in metadata_strategy()) {
        let validator = SchemaValidator::new();
        prop_assert_eq!(validator.validate(&map), validator.validate(&map));
    }

    #[test]
    fn every_spec_key_is_accounted_for(map in metadata_strategy()) {
        let report = SchemaValidator::new().validate(&map);
        let spec = map.spec_keys();
        for (name, _) in spec.iter() {
            let name = name.to_string();
            let placed = report.present_must.contains(&name)
                || report.present_should.contains(&name)
                || report.present_can.contains(&name)
                || report.unrecognized_keys.contains(&name);
            prop_assert!(placed, "{} not placed", name);
        }
        prop_assert_eq!(report.other_key_count, map.len() - spec.len());
    }
}
