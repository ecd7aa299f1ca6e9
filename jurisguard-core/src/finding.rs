// jurisguard-core/src/finding.rs
//! Core data structures for detection results.
//!
//! A [`Candidate`] is what a recognizer proposes: a byte span in the scanned
//! text, an entity type and a confidence score. The detector validates,
//! filters and de-overlaps candidates and hands back [`Finding`]s, which carry
//! character offsets. Neither type stores the matched substring.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entity::EntityType;

/// A span proposed by one recognizer. Offsets are byte offsets into the text
/// and must fall on `char` boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub entity_type: EntityType,
    pub start: usize,
    pub end: usize,
    pub score: f64,
    /// Name of the recognizer that produced the span, for debug logs.
    pub recognizer: String,
}

impl Candidate {
    pub fn new(entity_type: EntityType, start: usize, end: usize, score: f64, recognizer: impl Into<String>) -> Self {
        Self {
            entity_type,
            start,
            end,
            score,
            recognizer: recognizer.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn overlaps(&self, other: &Candidate) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// One detected PII span, in character offsets (`end` exclusive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub entity_type: EntityType,
    pub start: usize,
    pub end: usize,
    pub score: f64,
}

impl Finding {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn overlaps(&self, other: &Finding) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Counts findings per entity type, in tag order.
///
/// This is the only aggregate the library logs about a document.
pub fn entity_counts(findings: &[Finding]) -> BTreeMap<EntityType, usize> {
    let mut counts = BTreeMap::new();
    for finding in findings {
        *counts.entry(finding.entity_type.clone()).or_insert(0) += 1;
    }
    counts
}

/// Renders counts as `{EMAIL_ADDRESS: 1, PERSON: 2}` for log lines.
pub fn format_counts(counts: &BTreeMap<EntityType, usize>) -> String {
    let body = counts
        .iter()
        .map(|(entity, count)| format!("{}: {}", entity, count))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{}}}", body)
}
