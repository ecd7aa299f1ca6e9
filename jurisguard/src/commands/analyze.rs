// jurisguard/src/commands/analyze.rs
//! The `analyze` command: reports detected PII without modifying the text.

use anyhow::{Context, Result};
use log::info;
use std::io::{self, Write};

use jurisguard_core::RedactorConfig;

use crate::cli::AnalyzeCommand;
use crate::commands::{allowlist, build_engine, read_input};
use crate::ui::output_format::success_msg;
use crate::ui::summary::{counts_table, findings_table};

pub fn run_analyze(cmd: &AnalyzeCommand, config: &RedactorConfig, quiet: bool) -> Result<()> {
    info!("Starting analyze operation.");
    let input = read_input(cmd.input_file.as_deref())?;
    let engine = build_engine(config)?;

    let entities = allowlist(&cmd.entities);
    let report = engine
        .audit(&input, entities.as_deref())
        .context("Analysis failed")?;

    let stdout = io::stdout();
    let mut writer = stdout.lock();
    if cmd.json {
        writeln!(writer, "{}", report.to_json()?)?;
    } else if report.findings.is_empty() {
        if !quiet {
            success_msg("No PII detected.");
        }
    } else {
        writeln!(writer, "{}", findings_table(&report))?;
        writeln!(writer, "{}", counts_table(&report))?;
        writeln!(writer, "Total findings: {}", report.total())?;
    }
    info!("Analyze operation completed with {} finding(s).", report.total());
    Ok(())
}
