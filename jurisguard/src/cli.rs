// jurisguard/src/cli.rs
//! This file defines the command-line interface (CLI) for the jurisguard application,
//! including all available commands and their arguments.
//! License: MIT OR APACHE 2.0

use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::{Path, PathBuf};

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "jurisguard",
    author = "JurisGuard Team",
    version = env!("CARGO_PKG_VERSION"),
    about = "Redact personally identifiable information from document text",
    long_about = "JurisGuard detects personally identifiable information (names, contact details, government and financial identifiers, addresses) in document text and replaces it with policy-defined placeholders. It fails closed: when detection or redaction cannot complete, nothing is written to stdout and the exit status is non-zero.",
    arg_required_else_help = true,
)]
pub struct Cli {
    /// Disable informational messages
    #[arg(long, short = 'q', global = true, conflicts_with = "debug", help = "Suppress all log output and the redaction summary.")]
    pub quiet: bool,

    /// Enable debug logging (overrides RUST_LOG and JURISGUARD_LOG)
    #[arg(long, short = 'd', global = true, help = "Enable debug logging.")]
    pub debug: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log level forced by `--quiet` or `--debug`, if any.
    pub fn level_override(&self) -> Option<LevelFilter> {
        if self.quiet {
            Some(LevelFilter::Off)
        } else if self.debug {
            Some(LevelFilter::Debug)
        } else {
            None
        }
    }
}

/// All available commands for the `jurisguard` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Redacts PII from an input file or stdin.
    #[command(about = "Redacts PII from an input file or stdin and writes the sanitized text.")]
    Secure(SecureCommand),

    /// Reports detected PII without modifying the text.
    #[command(about = "Reports detected PII (type, position, score) without modifying the text.")]
    Analyze(AnalyzeCommand),
}

impl Commands {
    /// The configuration file named on the command line, if any.
    pub fn config_path(&self) -> Option<&Path> {
        match self {
            Commands::Secure(cmd) => cmd.config.as_deref(),
            Commands::Analyze(cmd) => cmd.config.as_deref(),
        }
    }

    /// Detection budget named on the command line, if any.
    pub fn timeout_ms(&self) -> Option<u64> {
        match self {
            Commands::Secure(cmd) => cmd.timeout_ms,
            Commands::Analyze(cmd) => cmd.timeout_ms,
        }
    }
}

/// Arguments for the `secure` command.
#[derive(Parser, Debug)]
pub struct SecureCommand {
    /// Path to an input file (reads from stdin if not provided).
    #[arg(long, short = 'i', value_name = "FILE", help = "Read input from a specified file instead of stdin.")]
    pub input_file: Option<PathBuf>,

    /// Write sanitized output to this file instead of stdout.
    #[arg(long, short = 'o', value_name = "FILE", help = "Write output to a specified file instead of stdout.")]
    pub output: Option<PathBuf>,

    /// Path to a configuration file (YAML).
    #[arg(long = "config", value_name = "FILE", env = "JURISGUARD_CONFIG", help = "Path to a configuration file (YAML).")]
    pub config: Option<PathBuf>,

    /// Restrict detection to these entity types (comma-separated).
    #[arg(long = "entities", short = 'e', value_delimiter = ',', value_name = "ENTITY", help = "Only detect these entity types (comma-separated), e.g. PERSON,EMAIL_ADDRESS.")]
    pub entities: Vec<String>,

    /// Detection time budget in milliseconds.
    #[arg(long = "timeout-ms", value_name = "MS", value_parser = clap::value_parser!(u64).range(1..), help = "Abort detection after this many milliseconds.")]
    pub timeout_ms: Option<u64>,

    /// Suppress the redaction summary.
    #[arg(long = "no-summary", help = "Do not print the per-type redaction summary to stderr.")]
    pub no_summary: bool,
}

/// Arguments for the `analyze` command.
#[derive(Parser, Debug)]
pub struct AnalyzeCommand {
    /// Path to an input file (reads from stdin if not provided).
    #[arg(long, short = 'i', value_name = "FILE", help = "Read input from a specified file instead of stdin.")]
    pub input_file: Option<PathBuf>,

    /// Path to a configuration file (YAML).
    #[arg(long = "config", value_name = "FILE", env = "JURISGUARD_CONFIG", help = "Path to a configuration file (YAML).")]
    pub config: Option<PathBuf>,

    /// Restrict detection to these entity types (comma-separated).
    #[arg(long = "entities", short = 'e', value_delimiter = ',', value_name = "ENTITY", help = "Only detect these entity types (comma-separated), e.g. PERSON,EMAIL_ADDRESS.")]
    pub entities: Vec<String>,

    /// Detection time budget in milliseconds.
    #[arg(long = "timeout-ms", value_name = "MS", value_parser = clap::value_parser!(u64).range(1..), help = "Abort detection after this many milliseconds.")]
    pub timeout_ms: Option<u64>,

    /// Print the audit report as JSON to stdout.
    #[arg(long = "json", help = "Print the audit report as JSON instead of a table.")]
    pub json: bool,
}
