//! # modelspec CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use modelspec_cli::keys::{run_keys, KeysArgs};
use modelspec_cli::show::{run_show, ShowArgs};
use modelspec_cli::stamp::{run_stamp, StampArgs};
use modelspec_cli::validate::{run_validate, ValidateArgs};

/// ModelSpec metadata tools for `.safetensors` files.
///
/// Validates `modelspec.*` header metadata against the key registry,
/// verifies content hashes, lists header contents, and stamps metadata
/// into copies of files.
#[derive(Parser, Debug)]
#[command(name = "modelspec", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML validator configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check files or directories for ModelSpec conformance.
    Validate(ValidateArgs),

    /// Print the modelspec.* metadata of one file.
    Show(ShowArgs),

    /// List the key registry.
    Keys(KeysArgs),

    /// Write modelspec.* metadata into a copy of a file.
    Stamp(StampArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "modelspec CLI starting");

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Validate(args) => run_validate(&args, config),
        Commands::Show(args) => run_show(&args),
        Commands::Keys(args) => run_keys(&args, config),
        Commands::Stamp(args) => run_stamp(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}
