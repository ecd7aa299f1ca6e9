// jurisguard-core/src/redaction.rs
//! Applies a replacement policy to detected findings.
//!
//! Redaction is all-or-nothing: every finding is checked and every replacement
//! rendered before the result is returned, and any problem yields
//! `RedactionFailed` with no partially redacted text.
//!
//! License: MIT OR APACHE 2.0

use log::info;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::entity::EntityType;
use crate::errors::RedactorError;
use crate::finding::{entity_counts, format_counts, Finding};
use crate::offsets::OffsetMap;
use crate::policy::PolicyStore;

/// Sanitized text plus what was removed from it, by entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redaction {
    pub text: String,
    pub entity_counts: BTreeMap<EntityType, usize>,
}

impl Redaction {
    /// True when nothing was redacted.
    pub fn is_clean(&self) -> bool {
        self.entity_counts.is_empty()
    }

    pub fn total(&self) -> usize {
        self.entity_counts.values().sum()
    }
}

/// Replaces every finding in `text` according to `policy`.
///
/// `findings` are in character offsets and must not overlap. Text outside the
/// findings is copied unchanged.
pub fn redact(text: &str, findings: &[Finding], policy: &PolicyStore) -> Result<Redaction, RedactorError> {
    if findings.is_empty() {
        info!("No PII entities detected in text.");
        return Ok(Redaction {
            text: text.to_string(),
            entity_counts: BTreeMap::new(),
        });
    }

    let offsets = OffsetMap::new(text);
    let mut spans = Vec::with_capacity(findings.len());
    for finding in findings {
        let bytes = if finding.start < finding.end {
            offsets
                .char_to_byte(finding.start)
                .zip(offsets.char_to_byte(finding.end))
        } else {
            None
        };
        let Some((start, end)) = bytes else {
            return Err(RedactorError::RedactionFailed(format!(
                "{} finding {}..{} is outside a text of {} characters",
                finding.entity_type,
                finding.start,
                finding.end,
                offsets.char_len()
            )));
        };
        spans.push((start, end, finding));
    }

    spans.sort_by(|a, b| b.0.cmp(&a.0));
    // Descending by start: each span must end before the previous one starts.
    for pair in spans.windows(2) {
        let (later, earlier) = (&pair[0], &pair[1]);
        if earlier.1 > later.0 {
            return Err(RedactorError::RedactionFailed(format!(
                "overlapping findings for {} and {}",
                earlier.2.entity_type, later.2.entity_type
            )));
        }
    }

    let mut sanitized = text.to_string();
    for (start, end, finding) in &spans {
        let replacement = policy
            .render(&finding.entity_type, &text[*start..*end])
            .map_err(|e| match e {
                RedactorError::RedactionFailed(_) => e,
                other => RedactorError::RedactionFailed(other.to_string()),
            })?;
        sanitized.replace_range(*start..*end, &replacement);
    }

    let counts = entity_counts(findings);
    info!("Redacted {} PII entities: {}", findings.len(), format_counts(&counts));
    Ok(Redaction {
        text: sanitized,
        entity_counts: counts,
    })
}
