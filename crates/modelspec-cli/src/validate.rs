//! # Validate Subcommand
//!
//! Conformance check of `.safetensors` files. Each path argument is either
//! a file or a directory; directories are walked recursively for
//! `*.safetensors`.
//!
//! A file passes when its verdict is not `NON_CONFORMANT` (with `--strict`,
//! only `CONFORMANT` passes) and, with `--verify-hash`, its stored
//! `modelspec.hash_sha256` does not disagree with the tensor data.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::Serialize;

use modelspec_core::{HashDigest, RegistryRevision};
use modelspec_schema::{ConformanceReport, SchemaValidator, Verdict};

use crate::header::{hash_tensor_data, read_header};

/// File extension picked up when walking directories.
pub const SAFETENSORS_EXTENSION: &str = "safetensors";

/// Report rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON array of per-file results.
    Json,
}

/// Arguments for the `modelspec validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Files or directories to validate.
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Validate against this registry revision instead of detecting it.
    #[arg(long, value_name = "REVISION")]
    pub revision: Option<RegistryRevision>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Hash the tensor data and compare with modelspec.hash_sha256.
    #[arg(long)]
    pub verify_hash: bool,

    /// Fail files with any finding, not only non-conformant ones.
    #[arg(long)]
    pub strict: bool,
}

/// Outcome of `--verify-hash` for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HashCheck {
    /// Stored hash equals the computed one.
    Match { digest: HashDigest },
    /// Stored hash differs from the computed one.
    Mismatch { expected: String, actual: HashDigest },
    /// No string `modelspec.hash_sha256` to compare against.
    Absent { actual: HashDigest },
}

impl HashCheck {
    /// Compare a stored header value against the computed digest.
    pub fn compare(stored: Option<&str>, actual: HashDigest) -> Self {
        match stored {
            None => Self::Absent { actual },
            Some(expected) if expected == actual.as_str() => Self::Match { digest: actual },
            Some(expected) => Self::Mismatch {
                expected: expected.to_string(),
                actual,
            },
        }
    }

    /// True for [`HashCheck::Mismatch`].
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Self::Mismatch { .. })
    }
}

impl std::fmt::Display for HashCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Match { digest } => write!(f, "hash: match {digest}"),
            Self::Mismatch { expected, actual } => {
                write!(f, "hash: MISMATCH stored {expected} != computed {actual}")
            }
            Self::Absent { actual } => write!(f, "hash: absent (computed {actual})"),
        }
    }
}

/// Result for one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub path: PathBuf,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ConformanceReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<HashCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileResult {
    fn failed(path: &Path, error: String) -> Self {
        Self {
            path: path.to_path_buf(),
            passed: false,
            report: None,
            hash: None,
            error: Some(error),
        }
    }
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 when every file passes, 1 when any file fails
/// validation, 2 when any file could not be read.
pub fn run_validate(args: &ValidateArgs, config_path: Option<&Path>) -> Result<u8> {
    let config = crate::load_config(config_path)?;
    let mut validator =
        SchemaValidator::from_config(&config).context("invalid validator config")?;
    if args.revision.is_some() {
        validator = validator.with_revision(args.revision);
    }

    let files = collect_targets(&args.paths);
    if files.is_empty() {
        println!("{}", render(&[], args.format)?);
        return Ok(1);
    }

    tracing::info!(files = files.len(), "validating");

    let results: Vec<FileResult> = files
        .iter()
        .map(|path| validate_file(&validator, path, args))
        .collect();

    println!("{}", render(&results, args.format)?);
    Ok(exit_code(&results))
}

/// Validate one file. Read failures become a failed result, not an error.
pub fn validate_file(validator: &SchemaValidator, path: &Path, args: &ValidateArgs) -> FileResult {
    let header = match read_header(path) {
        Ok(header) => header,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read metadata");
            return FileResult::failed(path, format!("cannot read metadata: {e}"));
        }
    };

    let report = validator.validate(&header.metadata);

    let hash = if args.verify_hash {
        match hash_tensor_data(path, header.data_offset) {
            Ok(actual) => {
                let spec = header.metadata.spec_keys();
                Some(HashCheck::compare(spec.get_str("hash_sha256"), actual))
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot hash tensor data");
                return FileResult::failed(path, format!("cannot hash tensor data: {e}"));
            }
        }
    } else {
        None
    };

    let verdict_ok = if args.strict {
        report.verdict == Verdict::Conformant
    } else {
        report.is_conformant()
    };
    let hash_ok = !hash.as_ref().is_some_and(HashCheck::is_mismatch);

    FileResult {
        path: path.to_path_buf(),
        passed: verdict_ok && hash_ok,
        report: Some(report),
        hash,
        error: None,
    }
}

/// Exit code for a batch: read errors dominate validation failures.
pub fn exit_code(results: &[FileResult]) -> u8 {
    if results.iter().any(|r| r.error.is_some()) {
        2
    } else if results.iter().any(|r| !r.passed) {
        1
    } else {
        0
    }
}

/// The report for a batch in the requested format. An empty batch is
/// `[]` in JSON and a one-line notice in text.
pub fn render(results: &[FileResult], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(results).context("failed to render JSON")
        }
        OutputFormat::Text if results.is_empty() => {
            Ok(format!("No .{SAFETENSORS_EXTENSION} files found."))
        }
        OutputFormat::Text => Ok(render_text(results).join("\n")),
    }
}

fn render_text(results: &[FileResult]) -> Vec<String> {
    let mut lines = Vec::new();
    for result in results {
        let status = if result.passed { "OK" } else { "FAIL" };
        lines.push(format!("{status}: {}", result.path.display()));
        if let Some(error) = &result.error {
            lines.push(format!("  {error}"));
        }
        if let Some(report) = &result.report {
            lines.extend(report.to_string().lines().map(|line| format!("  {line}")));
        }
        if let Some(hash) = &result.hash {
            lines.push(format!("  {hash}"));
        }
    }
    let passed = results.iter().filter(|r| r.passed).count();
    lines.push(format!("Files: {passed}/{} conformant", results.len()));
    lines
}

/// Expand path arguments: directories become their `*.safetensors`
/// files (sorted), files are kept as given. Duplicates are dropped.
pub fn collect_targets(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut targets = Vec::new();
    for path in paths {
        let expanded = if path.is_dir() {
            find_safetensors_files(path)
        } else {
            vec![path.clone()]
        };
        for file in expanded {
            if seen.insert(file.clone()) {
                targets.push(file);
            }
        }
    }
    targets
}

/// Recursively find `*.safetensors` files under a directory.
pub fn find_safetensors_files(dir: &Path) -> Vec<PathBuf> {
    let mut results = Vec::new();
    walk_for_files(dir, &mut results);
    results.sort();
    results
}

fn walk_for_files(dir: &Path, acc: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!(
                dir = %dir.display(),
                error = %e,
                "failed to read directory during file walk"
            );
            return;
        }
    };
    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "failed to read directory entry");
                continue;
            }
        };
        let path = entry.path();
        if path.is_dir() {
            walk_for_files(&path, acc);
        } else if path.extension().and_then(|e| e.to_str()) == Some(SAFETENSORS_EXTENSION) {
            acc.push(path);
        }
    }
}
