//! # Validator Configuration
//!
//! Optional YAML file tuning the validator without code changes:
//!
//! ```yaml
//! revision: "1.0.1"            # force one registry revision
//! default_revision: "1.0.0"    # used when no version key is present
//! image_architectures: [stable-diffusion, flux]
//! text_architectures: [gpt, llama, qwen]
//! tier_overrides:
//!   resolution: must
//! ```
//!
//! Every field is optional. Unknown fields are rejected so a typo does
//! not silently fall back to a default.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use modelspec_core::{ModelSpecError, RegistryRevision, Tier};

use crate::resolve::{DEFAULT_IMAGE_ARCHITECTURES, DEFAULT_TEXT_ARCHITECTURES};

/// Errors raised while loading or applying a [`ValidatorConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file does not exist.
    #[error("config file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// The config file could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not valid YAML for this schema.
    #[error("invalid config {context}: {source}")]
    Parse {
        context: String,
        source: serde_yaml::Error,
    },

    /// A tier override names a key the registry does not define.
    #[error("invalid tier override: {0}")]
    InvalidOverride(#[from] ModelSpecError),
}

/// Validator settings, typically loaded from `--config <path>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Force this revision for every file instead of detecting it.
    pub revision: Option<RegistryRevision>,
    /// Revision used when a header carries neither version key.
    pub default_revision: RegistryRevision,
    /// Image-generation architecture family fragments.
    pub image_architectures: Vec<String>,
    /// Text-prediction architecture family fragments.
    pub text_architectures: Vec<String>,
    /// Per-key tier replacements, applied to every revision.
    pub tier_overrides: BTreeMap<String, Tier>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            revision: None,
            default_revision: RegistryRevision::default(),
            image_architectures: DEFAULT_IMAGE_ARCHITECTURES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            text_architectures: DEFAULT_TEXT_ARCHITECTURES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            tier_overrides: BTreeMap::new(),
        }
    }
}

impl ValidatorConfig {
    /// Load from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            context: path.display().to_string(),
            source: e,
        })
    }

    /// Parse from an in-memory YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse {
            context: "<inline>".to_string(),
            source: e,
        })
    }
}
