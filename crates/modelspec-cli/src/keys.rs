//! # Keys Subcommand
//!
//! Prints the key registry as a table. Tier overrides from `--config` are
//! applied, so the listing shows what `validate` will actually enforce.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use modelspec_core::{Category, KeyDefinition, Registry, RegistryRevision};
use modelspec_schema::SchemaValidator;

/// Arguments for the `modelspec keys` subcommand.
#[derive(Args, Debug)]
pub struct KeysArgs {
    /// Registry revision to list (defaults to the configured default).
    #[arg(long, value_name = "REVISION")]
    pub revision: Option<RegistryRevision>,

    /// Only list keys of this category.
    #[arg(long, value_name = "CATEGORY")]
    pub category: Option<Category>,
}

/// Execute the keys subcommand.
pub fn run_keys(args: &KeysArgs, config_path: Option<&Path>) -> Result<u8> {
    let config = crate::load_config(config_path)?;
    let validator =
        SchemaValidator::from_config(&config).context("invalid validator config")?;
    let revision = args
        .revision
        .or(config.revision)
        .unwrap_or(config.default_revision);

    for line in render(validator.registry(revision), args.category) {
        println!("{line}");
    }
    Ok(0)
}

/// Table lines for `registry`, optionally filtered to one category.
pub fn render(registry: &Registry, category: Option<Category>) -> Vec<String> {
    let mut lines = vec![
        format!("ModelSpec registry {}", registry.revision()),
        format!("{:<24} {:<7} {:<17} RULE", "KEY", "TIER", "CATEGORY"),
    ];
    lines.extend(
        registry
            .keys()
            .iter()
            .filter(|k| category.map_or(true, |c| k.category == c))
            .map(row),
    );
    lines
}

fn row(key: &KeyDefinition) -> String {
    let rule = key
        .format
        .map_or_else(|| "free text".to_string(), |f| f.describe());
    format!(
        "{:<24} {:<7} {:<17} {rule}",
        key.prefixed_name(),
        key.tier.as_str().to_uppercase(),
        key.category.as_str(),
    )
}
