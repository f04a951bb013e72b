//! # Stamp Subcommand
//!
//! Writes `modelspec.*` metadata into a copy of a `.safetensors` file.
//! Existing entries are kept unless `--clear` is given, `--set` entries
//! replace them key by key, and `--hash` records the digest of the tensor
//! data as `modelspec.hash_sha256`. The input file is never modified.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use modelspec_core::MODELSPEC_PREFIX;

use crate::header::{hash_tensor_data, read_header, write_header};

/// Arguments for the `modelspec stamp` subcommand.
#[derive(Args, Debug)]
pub struct StampArgs {
    /// The `.safetensors` file to read.
    #[arg(value_name = "IN")]
    pub input: PathBuf,

    /// Where to write the stamped copy. Must differ from IN.
    #[arg(value_name = "OUT")]
    pub output: PathBuf,

    /// Set a key, e.g. `--set title=My Model`. The `modelspec.` prefix is
    /// added when missing. Repeatable.
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(String, String)>,

    /// Record the SHA-256 of the tensor data as `modelspec.hash_sha256`.
    #[arg(long)]
    pub hash: bool,

    /// Drop existing `modelspec.*` entries before applying `--set`.
    #[arg(long)]
    pub clear: bool,
}

/// Execute the stamp subcommand.
pub fn run_stamp(args: &StampArgs) -> Result<u8> {
    if args.input == args.output {
        bail!("refusing to overwrite {} in place", args.input.display());
    }

    let header = read_header(&args.input)
        .with_context(|| format!("cannot read metadata from {}", args.input.display()))?;
    let mut metadata = header.metadata;

    if args.clear {
        let removed = metadata.remove_spec_keys();
        tracing::info!(removed, "cleared existing modelspec keys");
    }
    for (key, value) in &args.set {
        metadata.insert(key.clone(), value.clone());
    }
    if args.hash {
        let digest = hash_tensor_data(&args.input, header.data_offset)
            .with_context(|| format!("cannot hash {}", args.input.display()))?;
        metadata.insert(format!("{MODELSPEC_PREFIX}hash_sha256"), digest.as_str());
    }

    let written = write_header(&args.input, &args.output, &metadata)
        .with_context(|| format!("cannot write {}", args.output.display()))?;
    println!(
        "Wrote {} modelspec keys to {}",
        written.metadata.spec_keys().len(),
        args.output.display()
    );
    Ok(0)
}

/// Parse `KEY=VALUE`, prefixing a bare key with `modelspec.`.
pub fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {raw:?}"))?;
    let key = key.trim();
    if key.is_empty() || key == MODELSPEC_PREFIX {
        return Err(format!("missing key name in {raw:?}"));
    }
    let key = if key.starts_with(MODELSPEC_PREFIX) {
        key.to_string()
    } else {
        format!("{MODELSPEC_PREFIX}{key}")
    };
    Ok((key, value.to_string()))
}
