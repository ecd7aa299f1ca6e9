// jurisguard-core/src/audit.rs
//! Audit projections of detection results.
//!
//! Audit records carry entity type, character offsets and score only; the
//! matched substrings never leave the detector. An [`AuditReport`] wraps the
//! records with an id, a timestamp and per-type counts for storage or display.
//!
//! License: MIT OR APACHE 2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::entity::EntityType;
use crate::errors::RedactorError;
use crate::finding::{entity_counts, Finding};

/// One detected span, as exposed to auditors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub entity_type: EntityType,
    pub start: usize,
    pub end: usize,
    pub score: f64,
}

impl From<&Finding> for AuditRecord {
    fn from(finding: &Finding) -> Self {
        Self {
            entity_type: finding.entity_type.clone(),
            start: finding.start,
            end: finding.end,
            score: finding.score,
        }
    }
}

/// Projects findings to audit records, preserving order.
pub fn report(findings: &[Finding]) -> Vec<AuditRecord> {
    findings.iter().map(AuditRecord::from).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub report_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Length of the analyzed text in characters.
    pub text_length: usize,
    pub entity_counts: BTreeMap<EntityType, usize>,
    pub findings: Vec<AuditRecord>,
}

impl AuditReport {
    pub fn new(text: &str, findings: &[Finding]) -> Self {
        Self {
            report_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            text_length: text.chars().count(),
            entity_counts: entity_counts(findings),
            findings: report(findings),
        }
    }

    pub fn total(&self) -> usize {
        self.findings.len()
    }

    pub fn to_json(&self) -> Result<String, RedactorError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| RedactorError::RedactionFailed(format!("failed to serialize audit report: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(tag: &str, start: usize, end: usize, score: f64) -> Finding {
        Finding {
            entity_type: EntityType::new(tag).unwrap(),
            start,
            end,
            score,
        }
    }

    #[test]
    fn test_report_is_a_projection() {
        let findings = vec![finding("PERSON", 8, 18, 0.85), finding("EMAIL_ADDRESS", 22, 36, 1.0)];
        let records = report(&findings);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].entity_type.as_str(), "PERSON");
        assert_eq!((records[1].start, records[1].end, records[1].score), (22, 36, 1.0));
        assert!(report(&[]).is_empty());
    }

    #[test]
    fn test_report_json_has_no_text() {
        let text = "Contact John Smith at john@email.com";
        let findings = vec![finding("PERSON", 8, 18, 0.85)];
        let audit = AuditReport::new(text, &findings);
        let json = audit.to_json().unwrap();

        assert!(!json.contains("John"));
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["text_length"], 36);
        assert_eq!(parsed["entity_counts"]["PERSON"], 1);
        assert_eq!(parsed["findings"][0]["entity_type"], "PERSON");

        let round: AuditReport = serde_json::from_str(&json).unwrap();
        assert_eq!(round.report_id, audit.report_id);
    }
}
