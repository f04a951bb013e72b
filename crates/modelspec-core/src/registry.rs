//! # Key Registry — Versioned Snapshots
//!
//! The registry is the single source of truth for every key the standard
//! defines: its name, tier, category and format rule. Keys are looked up
//! by their bare name (`architecture`), after the `modelspec.` prefix has
//! been stripped.
//!
//! ## Revisions
//!
//! Two revisions of the standard are in circulation and they disagree:
//!
//! | Revision | Version key | `resolution` tier |
//! |----------|------------------|--------|
//! | `1.0.0`  | `sai_model_spec` | SHOULD |
//! | `1.0.1`  | `version`        | MUST   |
//!
//! Both ship as snapshots. A caller either names one explicitly or lets
//! the validator detect it from the version key present in the header.
//!
//! ## Lifecycle
//!
//! Snapshots are built once per process on first access and are immutable
//! afterwards. A configured registry (tier overrides from a config file) is
//! an owned copy; the shared snapshot is never modified.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::category::{Category, ResolvedCategory};
use crate::error::ModelSpecError;
use crate::format::{FormatRule, Pattern};
use crate::tier::Tier;

use Category::{General, ImageGeneration, TextPrediction};
use Tier::{Can, Must, Should};

/// Prefix carried by every spec key inside `__metadata__`.
pub const MODELSPEC_PREFIX: &str = "modelspec.";

/// One key defined by the standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDefinition {
    /// Bare key name, without the `modelspec.` prefix.
    pub name: &'static str,
    /// Requirement level.
    pub tier: Tier,
    /// Which models the key applies to.
    pub category: Category,
    /// Value format; `None` means any string.
    pub format: Option<FormatRule>,
    /// One-line description for listings.
    pub summary: &'static str,
}

impl KeyDefinition {
    const fn new(
        name: &'static str,
        tier: Tier,
        category: Category,
        format: Option<FormatRule>,
        summary: &'static str,
    ) -> Self {
        Self {
            name,
            tier,
            category,
            format,
            summary,
        }
    }

    /// The key as it appears in a header, e.g. `modelspec.title`.
    pub fn prefixed_name(&self) -> String {
        format!("{MODELSPEC_PREFIX}{}", self.name)
    }
}

/// A published revision of the key registry.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum RegistryRevision {
    /// Version key `sai_model_spec`; `resolution` is SHOULD.
    #[default]
    #[serde(rename = "1.0.0")]
    V1_0_0,
    /// Version key `version`; `resolution` is MUST.
    #[serde(rename = "1.0.1")]
    V1_0_1,
}

impl RegistryRevision {
    /// All shipped revisions, oldest first.
    pub fn all() -> &'static [RegistryRevision] {
        &[Self::V1_0_0, Self::V1_0_1]
    }

    /// The revision identifier, e.g. `"1.0.0"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1_0_0 => "1.0.0",
            Self::V1_0_1 => "1.0.1",
        }
    }

    /// Bare name of the key carrying the spec version in this revision.
    pub fn version_key(&self) -> &'static str {
        match self {
            Self::V1_0_0 => "sai_model_spec",
            Self::V1_0_1 => "version",
        }
    }

    /// The revision whose version key is `key`, if any.
    pub fn for_version_key(key: &str) -> Option<Self> {
        Self::all().iter().copied().find(|r| r.version_key() == key)
    }
}

impl std::fmt::Display for RegistryRevision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistryRevision {
    type Err = ModelSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches('v') {
            "1.0.0" => Ok(Self::V1_0_0),
            "1.0.1" => Ok(Self::V1_0_1),
            _ => Err(ModelSpecError::UnknownRevision(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Format rules shared by the snapshots
// ---------------------------------------------------------------------------

static THUMBNAIL: Pattern = Pattern::new(
    r"^data:image/[a-z0-9.+-]+;base64,",
    "data:image/<type>;base64,<data> URI",
);
static TIMESTEP_RANGE: Pattern = Pattern::new(r"^\d+,\d+$", "<min>,<max> integers");
static ENCODER_LAYER: Pattern = Pattern::new(r"^\d+$", "non-negative integer");
static FORMAT_TEMPLATE: Pattern = Pattern::new(
    r"\{(system|prompt|user|assistant|response)\}",
    "template containing {system}, {prompt}, {user}, {assistant} or {response}",
);

static TEXT_ELEMENT: FormatRule = FormatRule::FreeText;

const PREDICTION_TYPES: &[&str] = &["epsilon", "v"];
const FORMAT_TYPES: &[&str] = &[
    "completion",
    "chatml",
    "alpaca",
    "vicuna",
    "llama2",
    "llama3",
    "mistral",
];
const BOOLEANS: &[&str] = &["true", "false"];

/// GENERAL keys common to every revision (the version key is added per revision).
static GENERAL_KEYS: [KeyDefinition; 13] = [
    KeyDefinition::new(
        "architecture",
        Must,
        General,
        None,
        "architecture ID of the inference code path",
    ),
    KeyDefinition::new(
        "implementation",
        Must,
        General,
        None,
        "reference to the implementing codebase",
    ),
    KeyDefinition::new("title", Must, General, None, "human-readable model title"),
    KeyDefinition::new(
        "author",
        Should,
        General,
        None,
        "individual or organisation that made the model",
    ),
    KeyDefinition::new(
        "description",
        Should,
        General,
        None,
        "what users need to know about the model",
    ),
    KeyDefinition::new("date", Should, General, Some(FormatRule::Iso8601Date), "creation date"),
    KeyDefinition::new(
        "hash_sha256",
        Should,
        General,
        Some(FormatRule::HashHex),
        "SHA-256 of the tensor data",
    ),
    KeyDefinition::new("license", Can, General, None, "license identifier"),
    KeyDefinition::new("usage_hint", Can, General, None, "short hint on how to use the model"),
    KeyDefinition::new(
        "thumbnail",
        Can,
        General,
        Some(FormatRule::Regex(&THUMBNAIL)),
        "preview image as a data URI",
    ),
    KeyDefinition::new(
        "tags",
        Can,
        General,
        Some(FormatRule::CommaList(&TEXT_ELEMENT)),
        "search tags",
    ),
    KeyDefinition::new(
        "merged_from",
        Can,
        General,
        Some(FormatRule::CommaList(&TEXT_ELEMENT)),
        "source models of a merge",
    ),
    KeyDefinition::new(
        "trigger_phrase",
        Can,
        General,
        Some(FormatRule::CommaList(&TEXT_ELEMENT)),
        "phrases that activate the model",
    ),
];

/// IMAGE_GEN keys other than `resolution`, whose tier varies by revision.
static IMAGE_KEYS: [KeyDefinition; 5] = [
    KeyDefinition::new(
        "prediction_type",
        Can,
        ImageGeneration,
        Some(FormatRule::EnumOf { values: PREDICTION_TYPES, open: true }),
        "diffusion prediction target",
    ),
    KeyDefinition::new(
        "timestep_range",
        Can,
        ImageGeneration,
        Some(FormatRule::Regex(&TIMESTEP_RANGE)),
        "trained timestep range",
    ),
    KeyDefinition::new(
        "encoder_layer",
        Can,
        ImageGeneration,
        Some(FormatRule::Regex(&ENCODER_LAYER)),
        "text encoder layer used",
    ),
    KeyDefinition::new("preprocessor", Can, ImageGeneration, None, "expected input preprocessor"),
    KeyDefinition::new(
        "is_negative_embedding",
        Can,
        ImageGeneration,
        Some(FormatRule::EnumOf { values: BOOLEANS, open: false }),
        "whether an embedding is meant for negative prompts",
    ),
];

static TEXT_KEYS: [KeyDefinition; 3] = [
    KeyDefinition::new(
        "data_format",
        Should,
        TextPrediction,
        None,
        "numeric storage format of the weights",
    ),
    KeyDefinition::new(
        "format_type",
        Should,
        TextPrediction,
        Some(FormatRule::EnumOf { values: FORMAT_TYPES, open: true }),
        "prompt format family",
    ),
    KeyDefinition::new(
        "format_template",
        Can,
        TextPrediction,
        Some(FormatRule::Regex(&FORMAT_TEMPLATE)),
        "prompt template",
    ),
];

/// An immutable set of key definitions for one revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    revision: RegistryRevision,
    keys: Vec<KeyDefinition>,
}

impl Registry {
    /// The shared snapshot for `revision`, built on first access.
    pub fn snapshot(revision: RegistryRevision) -> &'static Registry {
        static V1_0_0: OnceLock<Registry> = OnceLock::new();
        static V1_0_1: OnceLock<Registry> = OnceLock::new();

        let cell = match revision {
            RegistryRevision::V1_0_0 => &V1_0_0,
            RegistryRevision::V1_0_1 => &V1_0_1,
        };
        cell.get_or_init(|| Self::build(revision))
    }

    fn build(revision: RegistryRevision) -> Self {
        let resolution_tier = match revision {
            RegistryRevision::V1_0_0 => Should,
            RegistryRevision::V1_0_1 => Must,
        };

        let capacity = 2 + GENERAL_KEYS.len() + IMAGE_KEYS.len() + TEXT_KEYS.len();
        let mut keys = Vec::with_capacity(capacity);
        keys.push(KeyDefinition::new(
            revision.version_key(),
            Must,
            General,
            None,
            "ModelSpec version the header follows",
        ));
        keys.extend_from_slice(&GENERAL_KEYS);
        keys.push(KeyDefinition::new(
            "resolution",
            resolution_tier,
            ImageGeneration,
            Some(FormatRule::DimensionPair),
            "native output resolution",
        ));
        keys.extend_from_slice(&IMAGE_KEYS);
        keys.extend_from_slice(&TEXT_KEYS);

        Self { revision, keys }
    }

    /// Copy of this registry with the tiers of the named keys replaced.
    ///
    /// # Errors
    ///
    /// Returns [`ModelSpecError::UnknownKey`] if an override names a key
    /// the registry does not define.
    pub fn with_tier_overrides(
        &self,
        overrides: &BTreeMap<String, Tier>,
    ) -> Result<Registry, ModelSpecError> {
        let mut copy = self.clone();
        for (name, tier) in overrides {
            let def = copy
                .keys
                .iter_mut()
                .find(|k| k.name == name.as_str())
                .ok_or_else(|| ModelSpecError::UnknownKey(name.clone()))?;
            def.tier = *tier;
        }
        Ok(copy)
    }

    /// The revision this registry implements.
    pub fn revision(&self) -> RegistryRevision {
        self.revision
    }

    /// Bare name of this revision's version key.
    pub fn version_key(&self) -> &'static str {
        self.revision.version_key()
    }

    /// Look up a key by bare name. Unregistered keys return `None`.
    pub fn lookup(&self, name: &str) -> Option<&KeyDefinition> {
        self.keys.iter().find(|k| k.name == name)
    }

    /// Every key, in registry order.
    pub fn keys(&self) -> &[KeyDefinition] {
        &self.keys
    }

    /// Keys belonging to exactly `category`.
    pub fn keys_in(&self, category: Category) -> impl Iterator<Item = &KeyDefinition> + '_ {
        self.keys.iter().filter(move |k| k.category == category)
    }

    /// Keys that apply to a file resolved as `resolved` (GENERAL ∪ category).
    pub fn keys_for(
        &self,
        resolved: ResolvedCategory,
    ) -> impl Iterator<Item = &KeyDefinition> + '_ {
        self.keys.iter().filter(move |k| k.category.applies_to(resolved))
    }

    /// Look up `name` among the keys that apply to `resolved`.
    pub fn lookup_for(&self, name: &str, resolved: ResolvedCategory) -> Option<&KeyDefinition> {
        self.lookup(name).filter(|k| k.category.applies_to(resolved))
    }
}
