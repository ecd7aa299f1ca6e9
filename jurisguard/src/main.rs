// jurisguard/src/main.rs
//! JurisGuard entry point.
//!
//! Loads `.env`, resolves configuration, sets up logging and dispatches to
//! the selected subcommand. Errors are reported on stderr and mapped to an
//! exit code per failure kind.

use anyhow::Result;
use clap::Parser;
use log::debug;
use std::process::ExitCode;

use jurisguard::cli::{Cli, Commands};
use jurisguard::commands::{analyze::run_analyze, load_config, secure::run_secure};
use jurisguard::logger;
use jurisguard::ui::output_format::error_msg;
use jurisguard_core::RedactorError;

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli.command.config_path(), cli.command.timeout_ms())?;
    logger::init_logger(cli.level_override(), config.log_level.as_deref());
    debug!(
        "Resolved configuration: {} custom pattern(s), threshold {}, timeout {:?} ms, analyzer {}.",
        config.patterns.len(),
        config.score_threshold,
        config.detection_timeout_ms,
        config.analyzer.endpoint.as_deref().unwrap_or("none")
    );

    match &cli.command {
        Commands::Secure(cmd) => run_secure(cmd, &config, cli.quiet),
        Commands::Analyze(cmd) => run_analyze(cmd, &config, cli.quiet),
    }
}

/// Exit status for a failed run, by the first `RedactorError` in the chain.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.chain().find_map(|cause| cause.downcast_ref::<RedactorError>()) {
        Some(RedactorError::InvalidInput(_)) => 2,
        Some(RedactorError::EngineUnavailable(_)) => 3,
        Some(RedactorError::DetectionTimeout { .. }) => 4,
        Some(RedactorError::RedactionFailed(_)) => 5,
        Some(_) => 6,
        None => 1,
    }
}

fn main() -> ExitCode {
    // A missing .env file is the common case.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error_msg(format!("{:#}", err));
            ExitCode::from(exit_code(&err))
        }
    }
}
