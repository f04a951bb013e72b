//! # modelspec-cli — ModelSpec Command-Line Interface
//!
//! Provides the `modelspec` binary.
//!
//! ## Subcommands
//!
//! - `modelspec validate` — Conformance check of one or more files or
//!   directories, with optional content-hash verification.
//! - `modelspec show` — Print the `modelspec.*` entries of one file.
//! - `modelspec keys` — Print the key registry.
//! - `modelspec stamp` — Write `modelspec.*` entries into a copy of a file.
//!
//! ```bash
//! modelspec validate models/ --verify-hash
//! modelspec validate sdxl.safetensors --revision 1.0.1 --format json
//! modelspec show sdxl.safetensors
//! modelspec keys --category image_generation
//! modelspec stamp base.safetensors out.safetensors --set title=Base --hash
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the handlers.
//! - Handlers return exit codes: `0` success, `1` a file failed
//!   validation, `2` operational error.
//! - Reports go to stdout; logs go to stderr.

pub mod header;
pub mod keys;
pub mod show;
pub mod stamp;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};

use modelspec_schema::ValidatorConfig;

/// Load `--config` if given, otherwise the defaults.
pub fn load_config(path: Option<&Path>) -> Result<ValidatorConfig> {
    match path {
        Some(path) => {
            let config = ValidatorConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?;
            tracing::info!(config = %path.display(), "loaded validator config");
            Ok(config)
        }
        None => Ok(ValidatorConfig::default()),
    }
}
