//! # Category Resolution
//!
//! Decides which category-specific rule set applies to a header, so the
//! validator knows whether image-generation or text-prediction keys are
//! expected.
//!
//! ## Algorithm
//!
//! 1. Explicit marker keys win. `resolution` or `prediction_type` mark an
//!    image-generation model; `data_format` marks a text-prediction model.
//!    If markers of exactly one kind are present, that kind is the answer.
//! 2. With no markers, or markers of both kinds, the `architecture` value
//!    is matched (case-insensitive substring) against the image family
//!    allow-list, then the text family allow-list.
//! 3. Otherwise the result is [`ResolvedCategory::Unknown`]: general rules
//!    only. Unrecognised architecture strings are normal, not failures.
//!
//! Resolution is a pure function of the map and the allow-lists.

use modelspec_core::ResolvedCategory;

use crate::metadata::SpecKeys;

/// Keys whose presence marks an image-generation model.
pub const IMAGE_MARKER_KEYS: &[&str] = &["resolution", "prediction_type"];

/// Keys whose presence marks a text-prediction model.
pub const TEXT_MARKER_KEYS: &[&str] = &["data_format"];

/// Default image-generation architecture families.
pub const DEFAULT_IMAGE_ARCHITECTURES: &[&str] = &[
    "stable-diffusion",
    "stable-cascade",
    "stable-video-diffusion",
    "stable-zero123",
];

/// Default text-prediction architecture families.
pub const DEFAULT_TEXT_ARCHITECTURES: &[&str] = &["gpt", "llama", "stablelm", "mistral"];

/// Category resolver with configurable architecture allow-lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryResolver {
    image_architectures: Vec<String>,
    text_architectures: Vec<String>,
}

impl Default for CategoryResolver {
    fn default() -> Self {
        Self::new(
            DEFAULT_IMAGE_ARCHITECTURES.iter().map(|s| s.to_string()),
            DEFAULT_TEXT_ARCHITECTURES.iter().map(|s| s.to_string()),
        )
    }
}

impl CategoryResolver {
    /// Build a resolver from family fragments. Fragments are lowercased;
    /// empty fragments are dropped, since they would match everything.
    pub fn new(
        image_architectures: impl IntoIterator<Item = String>,
        text_architectures: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            image_architectures: normalise_families(image_architectures),
            text_architectures: normalise_families(text_architectures),
        }
    }

    /// Image family fragments in use.
    pub fn image_architectures(&self) -> &[String] {
        &self.image_architectures
    }

    /// Text family fragments in use.
    pub fn text_architectures(&self) -> &[String] {
        &self.text_architectures
    }

    /// Resolve the category of a header. Always returns exactly one value.
    pub fn resolve(&self, spec: &SpecKeys<'_>) -> ResolvedCategory {
        let image_marked = IMAGE_MARKER_KEYS.iter().any(|k| spec.contains(k));
        let text_marked = TEXT_MARKER_KEYS.iter().any(|k| spec.contains(k));

        match (image_marked, text_marked) {
            (true, false) => return ResolvedCategory::ImageGeneration,
            (false, true) => return ResolvedCategory::TextPrediction,
            _ => {}
        }

        spec.get_str("architecture")
            .map(|arch| self.resolve_architecture(arch))
            .unwrap_or(ResolvedCategory::Unknown)
    }

    /// Classify an architecture ID by the allow-lists alone.
    pub fn resolve_architecture(&self, architecture: &str) -> ResolvedCategory {
        let arch = architecture.to_ascii_lowercase();
        if self.image_architectures.iter().any(|f| arch.contains(f.as_str())) {
            ResolvedCategory::ImageGeneration
        } else if self.text_architectures.iter().any(|f| arch.contains(f.as_str())) {
            ResolvedCategory::TextPrediction
        } else {
            ResolvedCategory::Unknown
        }
    }
}

fn normalise_families(families: impl IntoIterator<Item = String>) -> Vec<String> {
    families
        .into_iter()
        .map(|f| f.trim().to_ascii_lowercase())
        .filter(|f| !f.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MetadataMap;

    fn resolve(pairs: &[(&str, &str)]) -> ResolvedCategory {
        let map: MetadataMap = pairs.iter().copied().collect();
        CategoryResolver::default().resolve(&map.spec_keys())
    }

    #[test]
    fn image_architecture_resolves_image() {
        assert_eq!(
            resolve(&[("modelspec.architecture", "stable-diffusion-xl-v1-base")]),
            ResolvedCategory::ImageGeneration
        );
        assert_eq!(
            resolve(&[("modelspec.architecture", "stable-diffusion-v1/lora")]),
            ResolvedCategory::ImageGeneration
        );
    }

    #[test]
    fn text_architecture_resolves_text() {
        assert_eq!(
            resolve(&[("modelspec.architecture", "gpt-neo-x")]),
            ResolvedCategory::TextPrediction
        );
    }

    #[test]
    fn architecture_match_is_case_insensitive() {
        assert_eq!(
            resolve(&[("modelspec.architecture", "Stable-Cascade-v1-prior")]),
            ResolvedCategory::ImageGeneration
        );
    }

    #[test]
    fn data_format_marks_text() {
        assert_eq!(
            resolve(&[("modelspec.data_format", "fp16")]),
            ResolvedCategory::TextPrediction
        );
    }

    #[test]
    fn explicit_markers_beat_architecture() {
        // An unfamiliar text architecture with an image marker.
        assert_eq!(
            resolve(&[
                ("modelspec.architecture", "gpt-image-adapter"),
                ("modelspec.resolution", "512x512"),
            ]),
            ResolvedCategory::ImageGeneration
        );
        assert_eq!(
            resolve(&[
                ("modelspec.architecture", "stable-diffusion-v2-text-encoder"),
                ("modelspec.data_format", "fp16"),
            ]),
            ResolvedCategory::TextPrediction
        );
    }

    #[test]
    fn conflicting_markers_fall_back_to_architecture() {
        assert_eq!(
            resolve(&[
                ("modelspec.architecture", "gpt-neo-x"),
                ("modelspec.data_format", "fp16"),
                ("modelspec.resolution", "512x512"),
            ]),
            ResolvedCategory::TextPrediction
        );
        assert_eq!(
            resolve(&[
                ("modelspec.data_format", "fp16"),
                ("modelspec.prediction_type", "v"),
            ]),
            ResolvedCategory::Unknown
        );
    }

    #[test]
    fn unknown_architecture_is_unknown() {
        assert_eq!(
            resolve(&[("modelspec.architecture", "my-own-arch")]),
            ResolvedCategory::Unknown
        );
        assert_eq!(resolve(&[]), ResolvedCategory::Unknown);
    }

    #[test]
    fn bare_marker_keys_are_ignored() {
        assert_eq!(
            resolve(&[("resolution", "512x512"), ("data_format", "fp16")]),
            ResolvedCategory::Unknown
        );
    }

    #[test]
    fn custom_allow_lists_replace_defaults() {
        let resolver = CategoryResolver::new(
            vec!["flux".to_string()],
            vec![" Qwen ".to_string(), String::new()],
        );
        assert_eq!(resolver.text_architectures(), ["qwen".to_string()]);
        assert_eq!(resolver.resolve_architecture("flux-1-dev"), ResolvedCategory::ImageGeneration);
        assert_eq!(resolver.resolve_architecture("qwen2-7b"), ResolvedCategory::TextPrediction);
        assert_eq!(
            resolver.resolve_architecture("stable-diffusion-xl-v1-base"),
            ResolvedCategory::Unknown
        );
    }
}
