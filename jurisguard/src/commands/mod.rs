// jurisguard/src/commands/mod.rs
//! Subcommand implementations and the input/config plumbing they share.

pub mod analyze;
pub mod secure;

use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use jurisguard_core::{init_engine, EngineHandle, RedactorConfig};

/// Reads the whole input from `path`, or from stdin when `path` is `None`.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            debug!("Reading input from file: {}", path.display());
            fs::read_to_string(path).with_context(|| format!("Failed to read input file {}", path.display()))
        }
        None => {
            debug!("Reading input from stdin.");
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read input from stdin")?;
            Ok(buffer)
        }
    }
}

/// Resolves the configuration and applies command-line overrides.
pub fn load_config(explicit: Option<&Path>, timeout_ms: Option<u64>) -> Result<RedactorConfig> {
    let mut config = RedactorConfig::load(explicit).context("Failed to load configuration")?;
    if let Some(ms) = timeout_ms {
        config.detection_timeout_ms = Some(ms);
    }
    Ok(config)
}

/// Builds the process-wide engine from `config`.
pub fn build_engine(config: &RedactorConfig) -> Result<Arc<EngineHandle>> {
    init_engine(config).context("Failed to initialize the PII engine")
}

/// `None` when no allowlist was given, so the configured default applies.
pub fn allowlist(entities: &[String]) -> Option<Vec<&str>> {
    if entities.is_empty() {
        None
    } else {
        Some(entities.iter().map(String::as_str).collect())
    }
}
