//! # Show Subcommand
//!
//! Prints the `modelspec.*` entries of one file without validating them.
//! Long values are cut to [`MAX_VALUE_CHARS`], and thumbnails or inline
//! images to the tighter [`MAX_IMAGE_CHARS`].

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use modelspec_core::MODELSPEC_PREFIX;

use crate::header::{read_header, Header};

/// Longest value printed in full.
pub const MAX_VALUE_CHARS: usize = 800;

/// Limit for `modelspec.thumbnail` and other `data:image/` values.
pub const MAX_IMAGE_CHARS: usize = 200;

const THUMBNAIL_KEY: &str = "modelspec.thumbnail";
const DATA_IMAGE_SCHEME: &str = "data:image/";

/// Arguments for the `modelspec show` subcommand.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// The `.safetensors` file to read.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Execute the show subcommand.
pub fn run_show(args: &ShowArgs) -> Result<u8> {
    let header = read_header(&args.file)
        .with_context(|| format!("cannot read metadata from {}", args.file.display()))?;
    for line in render(&header) {
        println!("{line}");
    }
    Ok(0)
}

/// Lines printed for one header.
pub fn render(header: &Header) -> Vec<String> {
    if !header.has_metadata {
        return vec!["File does not have metadata".to_string()];
    }

    let mut lines = vec!["File has metadata! Content:".to_string()];
    let mut other = 0usize;
    for (key, value) in header.metadata.iter() {
        if key.starts_with(MODELSPEC_PREFIX) {
            let value = display_value(value);
            let limit = value_limit(key, &value);
            lines.push(format!("    \"{key}\": \"{}\"", truncate(&value, limit)));
        } else {
            other += 1;
        }
    }
    lines.push(format!("Other keys: {other}"));
    lines
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Character limit for the value of `key`.
pub fn value_limit(key: &str, value: &str) -> usize {
    if key == THUMBNAIL_KEY || value.starts_with(DATA_IMAGE_SCHEME) {
        MAX_IMAGE_CHARS
    } else {
        MAX_VALUE_CHARS
    }
}

/// Cut `value` to `max` characters, marking the cut with `...`.
pub fn truncate(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &value[..cut]),
        None => value.to_string(),
    }
}
