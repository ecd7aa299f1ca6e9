// jurisguard-core/src/recognizer.rs
//! Defines the `Recognizer` trait and the injected NLP capability contract.
//!
//! A recognizer scans text for one or more entity types and proposes candidate
//! spans with a confidence score. The detector depends only on this trait, so
//! model-backed, pattern-based and checksum-validated recognizers compose into
//! one pool and the merge logic can be tested without a real model.
//!
//! License: MIT OR APACHE 2.0

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

use crate::entity::{EntitySet, EntityType};
use crate::errors::RedactorError;
use crate::finding::Candidate;

/// A pluggable source of candidate PII spans.
pub trait Recognizer: Send + Sync + fmt::Debug {
    /// Stable name used in logs and error messages.
    fn name(&self) -> &str;

    /// Entity types this recognizer can produce.
    fn supported_entities(&self) -> &EntitySet;

    /// Scans `text` for the requested `entities`.
    ///
    /// Offsets in the returned candidates are byte offsets into `text`. The
    /// recognizer should check `ctx.deadline` during long scans. Returning an
    /// error fails the whole detection pass.
    fn analyze(
        &self,
        text: &str,
        entities: &EntitySet,
        ctx: &AnalysisContext,
    ) -> Result<Vec<Candidate>, RedactorError>;
}

/// Per-call context shared by all recognizers of one detection pass.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    pub deadline: Deadline,
    pub language: String,
}

impl AnalysisContext {
    pub fn new(deadline: Deadline, language: impl Into<String>) -> Self {
        Self {
            deadline,
            language: language.into(),
        }
    }
}

impl Default for AnalysisContext {
    fn default() -> Self {
        Self::new(Deadline::none(), "en")
    }
}

/// A cooperative time bound for one detection pass.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    expires_at: Option<Instant>,
    budget: Option<Duration>,
}

impl Deadline {
    /// No time bound.
    pub fn none() -> Self {
        Self { expires_at: None, budget: None }
    }

    /// Expires `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            expires_at: Some(Instant::now() + budget),
            budget: Some(budget),
        }
    }

    pub fn from_option(budget: Option<Duration>) -> Self {
        budget.map_or_else(Self::none, Self::after)
    }

    /// Time left before the deadline; `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.map_or(false, |at| Instant::now() >= at)
    }

    /// Fails with `DetectionTimeout` once the budget is spent.
    pub fn check(&self) -> Result<(), RedactorError> {
        if self.is_expired() {
            Err(RedactorError::DetectionTimeout {
                budget_ms: self.budget.map_or(0, |b| b.as_millis() as u64),
            })
        } else {
            Ok(())
        }
    }
}

/// One result of an external entity analyzer, in character offsets.
///
/// The field names follow the JSON shape of Presidio-compatible analyzer
/// services so that results deserialize directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerResult {
    pub entity_type: String,
    pub start: usize,
    pub end: usize,
    pub score: f64,
}

/// The injected NLP entity recognition capability.
///
/// Implementations wrap a statistical model, a remote service or a test double.
/// They must be safe for concurrent use; a non-reentrant backend has to
/// serialize access internally.
pub trait EntityAnalyzer: Send + Sync {
    fn analyze(
        &self,
        text: &str,
        entity_types: &[EntityType],
        language: &str,
    ) -> anyhow::Result<Vec<AnalyzerResult>>;

    /// Like [`analyze`](Self::analyze), but should give up once `budget` has
    /// elapsed. Analyzers that cannot be interrupted keep the default.
    fn analyze_within(
        &self,
        text: &str,
        entity_types: &[EntityType],
        language: &str,
        budget: Option<Duration>,
    ) -> anyhow::Result<Vec<AnalyzerResult>> {
        let _ = budget;
        self.analyze(text, entity_types, language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_deadline_none_never_expires() {
        let deadline = Deadline::none();
        assert!(!deadline.is_expired());
        assert!(deadline.check().is_ok());
    }

    #[test]
    fn test_deadline_expires() {
        let deadline = Deadline::after(Duration::from_millis(1));
        sleep(Duration::from_millis(5));
        match deadline.check() {
            Err(RedactorError::DetectionTimeout { budget_ms }) => assert_eq!(budget_ms, 1),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_deadline_remaining() {
        assert_eq!(Deadline::none().remaining(), None);
        let remaining = Deadline::after(Duration::from_secs(60)).remaining().unwrap();
        assert!(remaining > Duration::from_secs(59));

        let spent = Deadline::after(Duration::from_millis(1));
        sleep(Duration::from_millis(5));
        assert_eq!(spent.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn test_analyzer_result_json_shape() {
        let parsed: AnalyzerResult =
            serde_json::from_str(r#"{"entity_type":"PERSON","start":8,"end":18,"score":0.85}"#).unwrap();
        assert_eq!(parsed.entity_type, "PERSON");
        assert_eq!((parsed.start, parsed.end), (8, 18));
    }
}
