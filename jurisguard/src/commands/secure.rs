// jurisguard/src/commands/secure.rs
//! The `secure` command: redacts PII and writes the sanitized text.
//!
//! Output is written only after the whole document has been redacted, so a
//! failure never leaves partial or unredacted text on stdout or in the
//! output file.

use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use log::{debug, info};
use std::fs;
use std::io::{self, Write};

use jurisguard_core::RedactorConfig;

use crate::cli::SecureCommand;
use crate::commands::{allowlist, build_engine, read_input};
use crate::ui::output_format::{info_msg, warn_msg};
use crate::ui::summary::print_summary;

pub fn run_secure(cmd: &SecureCommand, config: &RedactorConfig, quiet: bool) -> Result<()> {
    info!("Starting secure operation.");
    let input = read_input(cmd.input_file.as_deref())?;
    if input.trim().is_empty() && !quiet {
        warn_msg("Input is empty; nothing to redact.");
    }
    let engine = build_engine(config)?;

    let entities = allowlist(&cmd.entities);
    let redaction = engine
        .secure(&input, entities.as_deref())
        .context("Redaction failed")?;
    debug!(
        "Input length: {} bytes, sanitized length: {} bytes",
        input.len(),
        redaction.text.len()
    );

    match &cmd.output {
        Some(path) => {
            fs::write(path, &redaction.text)
                .with_context(|| format!("Failed to write output file {}", path.display()))?;
            if !quiet {
                info_msg(format!("Sanitized content written to {}", path.display()));
            }
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            writer
                .write_all(redaction.text.as_bytes())
                .context("Failed to write sanitized output")?;
            writer.flush().context("Failed to flush stdout")?;
        }
    }

    if !cmd.no_summary && !quiet {
        let stderr = io::stderr();
        let supports_color = stderr.is_terminal();
        print_summary(&redaction.entity_counts, &mut stderr.lock(), supports_color)?;
    }
    info!("Secure operation completed.");
    Ok(())
}
