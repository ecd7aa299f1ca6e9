// jurisguard-core/src/detector.rs
//! The detector: runs the recognizer pool over one text and merges the results.
//!
//! Detection is fail-closed. A recognizer error or an invalid candidate (empty,
//! out of bounds, off a character boundary, non-finite score) aborts the pass
//! with `EngineUnavailable`; the caller never receives a partial result that
//! might let PII through.
//!
//! Overlapping candidates are resolved greedily in a fixed priority order:
//! higher score, then longer span, then earlier start, then entity tag. The
//! outcome therefore does not depend on recognizer order.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, trace};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::config::DEFAULT_SCORE_THRESHOLD;
use crate::entity::EntitySet;
use crate::errors::RedactorError;
use crate::finding::{Candidate, Finding};
use crate::offsets::OffsetMap;
use crate::recognizer::{AnalysisContext, Deadline, Recognizer};

#[derive(Debug)]
pub struct Detector {
    recognizers: Vec<Box<dyn Recognizer>>,
    score_threshold: f64,
    language: String,
}

impl Detector {
    pub fn new(recognizers: Vec<Box<dyn Recognizer>>) -> Self {
        Self {
            recognizers,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            language: "en".to_string(),
        }
    }

    /// Candidates scoring below `threshold` are discarded.
    pub fn with_score_threshold(mut self, threshold: f64) -> Self {
        self.score_threshold = threshold;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn add_recognizer(&mut self, recognizer: Box<dyn Recognizer>) {
        self.recognizers.push(recognizer);
    }

    pub fn recognizer_names(&self) -> Vec<&str> {
        self.recognizers.iter().map(|r| r.name()).collect()
    }

    pub fn score_threshold(&self) -> f64 {
        self.score_threshold
    }

    /// Finds PII of the `entities` types in `text`.
    ///
    /// Returns non-overlapping findings in character offsets, sorted by start.
    pub fn detect(&self, text: &str, entities: &EntitySet, deadline: Deadline) -> Result<Vec<Finding>, RedactorError> {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        if self.recognizers.is_empty() {
            return Err(RedactorError::EngineUnavailable("no recognizers are loaded".to_string()));
        }

        let ctx = AnalysisContext::new(deadline, self.language.as_str());
        let mut candidates = Vec::new();

        for recognizer in &self.recognizers {
            if recognizer.supported_entities().intersection(entities).is_empty() {
                trace!("Skipping recognizer '{}': no requested entity types.", recognizer.name());
                continue;
            }
            ctx.deadline.check()?;

            let proposed = recognizer.analyze(text, entities, &ctx).map_err(|e| match e {
                RedactorError::DetectionTimeout { .. } | RedactorError::EngineUnavailable(_) => e,
                other => RedactorError::EngineUnavailable(format!(
                    "recognizer '{}' failed: {}",
                    recognizer.name(),
                    other
                )),
            })?;
            trace!("Recognizer '{}' proposed {} candidate(s).", recognizer.name(), proposed.len());

            for candidate in proposed {
                validate_candidate(text, &candidate)?;
                if !entities.contains(&candidate.entity_type) || candidate.score < self.score_threshold {
                    continue;
                }
                candidates.push(candidate);
            }
        }
        ctx.deadline.check()?;

        let total = candidates.len();
        let kept = resolve_overlaps(candidates);
        debug!("Detection kept {} of {} candidate(s) after overlap resolution.", kept.len(), total);

        let offsets = OffsetMap::new(text);
        kept.into_iter()
            .map(|candidate| {
                match (offsets.byte_to_char(candidate.start), offsets.byte_to_char(candidate.end)) {
                    (Some(start), Some(end)) => Ok(Finding {
                        entity_type: candidate.entity_type,
                        start,
                        end,
                        score: candidate.score,
                    }),
                    _ => Err(RedactorError::EngineUnavailable(format!(
                        "recognizer '{}' returned a span off a character boundary",
                        candidate.recognizer
                    ))),
                }
            })
            .collect()
    }
}

fn validate_candidate(text: &str, candidate: &Candidate) -> Result<(), RedactorError> {
    let problem = if candidate.start >= candidate.end {
        Some("an empty span")
    } else if candidate.end > text.len() {
        Some("a span past the end of the text")
    } else if !text.is_char_boundary(candidate.start) || !text.is_char_boundary(candidate.end) {
        Some("a span off a character boundary")
    } else if !candidate.score.is_finite() || !(0.0..=1.0).contains(&candidate.score) {
        Some("a score outside [0, 1]")
    } else {
        None
    };
    match problem {
        Some(problem) => Err(RedactorError::EngineUnavailable(format!(
            "recognizer '{}' returned {} for {}",
            candidate.recognizer, problem, candidate.entity_type
        ))),
        None => Ok(()),
    }
}

/// Priority order for overlap resolution; `Less` means "wins".
fn priority(a: &Candidate, b: &Candidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.len().cmp(&a.len()))
        .then_with(|| a.start.cmp(&b.start))
        .then_with(|| a.entity_type.cmp(&b.entity_type))
        .then_with(|| a.end.cmp(&b.end))
}

/// Keeps a maximal set of non-overlapping candidates, choosing greedily by
/// priority. The result is sorted by start offset.
pub fn resolve_overlaps(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(priority);

    // Accepted spans never overlap, so ordering by start also orders by end.
    let mut accepted: BTreeMap<usize, Candidate> = BTreeMap::new();
    for candidate in candidates {
        let clashes = accepted
            .range(..candidate.end)
            .next_back()
            .map_or(false, |(_, previous)| previous.end > candidate.start);
        if !clashes {
            accepted.insert(candidate.start, candidate);
        }
    }
    accepted.into_values().collect()
}
