// jurisguard/src/ui/summary.rs
//! Per-type redaction summaries and the findings table of `analyze`.
//!
//! Neither output ever includes matched text: only entity types, offsets,
//! scores and counts.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use owo_colors::OwoColorize;
use std::collections::BTreeMap;
use std::io::{self, Write};

use jurisguard_core::{AuditReport, EntityType};

/// Writes the per-type counts of a redaction run.
pub fn print_summary<W: Write>(
    counts: &BTreeMap<EntityType, usize>,
    writer: &mut W,
    supports_color: bool,
) -> io::Result<()> {
    if counts.is_empty() {
        return writeln!(writer, "No PII detected.");
    }
    let total: usize = counts.values().sum();
    if supports_color {
        writeln!(writer, "{}", "Redaction Summary:".yellow().bold())?;
    } else {
        writeln!(writer, "Redaction Summary:")?;
    }
    let width = counts.keys().map(|k| k.as_str().len()).max().unwrap_or(0);
    for (entity, count) in counts {
        if supports_color {
            writeln!(writer, "  {:<width$}  {}", entity.as_str().cyan(), count.magenta(), width = width)?;
        } else {
            writeln!(writer, "  {:<width$}  {}", entity.as_str(), count, width = width)?;
        }
    }
    writeln!(writer, "  Total: {}", total)
}

/// Builds a table with one row per finding, followed by per-type totals.
pub fn findings_table(report: &AuditReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Entity Type", "Start", "End", "Score"]);

    for record in &report.findings {
        table.add_row(vec![
            Cell::new(record.entity_type.as_str()),
            Cell::new(record.start).set_alignment(CellAlignment::Right),
            Cell::new(record.end).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2}", record.score)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// Builds the per-type count table of a report.
pub fn counts_table(report: &AuditReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Entity Type", "Occurrences"]);
    for (entity, count) in &report.entity_counts {
        table.add_row(vec![
            Cell::new(entity.as_str()),
            Cell::new(count).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}
