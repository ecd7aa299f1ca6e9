// jurisguard-core/src/recognizers/nlp.rs
//! Adapts an injected [`EntityAnalyzer`] (a statistical NER model or a remote
//! service) to the [`Recognizer`] trait.
//!
//! Analyzers report character offsets; this adapter converts them to byte
//! offsets and rejects anything it cannot trust. An analyzer error, an unknown
//! entity tag or an out-of-range span fails the detection pass with
//! `EngineUnavailable` rather than silently losing findings.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, error};
use std::fmt;
use std::sync::Arc;

use crate::entity::{EntitySet, EntityType};
use crate::errors::RedactorError;
use crate::finding::Candidate;
use crate::offsets::OffsetMap;
use crate::recognizer::{AnalysisContext, EntityAnalyzer, Recognizer};

pub struct NlpRecognizer {
    name: String,
    analyzer: Arc<dyn EntityAnalyzer>,
    entities: EntitySet,
}

impl fmt::Debug for NlpRecognizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NlpRecognizer")
            .field("name", &self.name)
            .field("entities", &self.entities)
            .finish_non_exhaustive()
    }
}

impl NlpRecognizer {
    /// Wraps `analyzer`, which is asked only for the types in `entities`.
    pub fn new(name: impl Into<String>, analyzer: Arc<dyn EntityAnalyzer>, entities: EntitySet) -> Self {
        Self {
            name: name.into(),
            analyzer,
            entities,
        }
    }

    fn unavailable(&self, detail: impl fmt::Display) -> RedactorError {
        RedactorError::EngineUnavailable(format!("analyzer '{}' {}", self.name, detail))
    }
}

impl Recognizer for NlpRecognizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn supported_entities(&self) -> &EntitySet {
        &self.entities
    }

    fn analyze(&self, text: &str, entities: &EntitySet, ctx: &AnalysisContext) -> Result<Vec<Candidate>, RedactorError> {
        let requested = self.entities.intersection(entities);
        if requested.is_empty() {
            return Ok(Vec::new());
        }
        ctx.deadline.check()?;

        let results = match self
            .analyzer
            .analyze_within(text, &requested.to_vec(), &ctx.language, ctx.deadline.remaining())
        {
            Ok(results) => results,
            Err(e) => {
                // A call cut short by the detection budget is a timeout.
                ctx.deadline.check()?;
                error!("Analyzer '{}' failed: {:#}", self.name, e);
                return Err(self.unavailable(format!("failed: {:#}", e)));
            }
        };
        ctx.deadline.check()?;
        debug!("Analyzer '{}' returned {} result(s).", self.name, results.len());

        let offsets = OffsetMap::new(text);
        let mut candidates = Vec::with_capacity(results.len());
        for result in results {
            let entity_type = EntityType::new(&result.entity_type)
                .map_err(|e| self.unavailable(format!("returned an unusable entity type: {}", e)))?;
            let (Some(start), Some(end)) = (offsets.char_to_byte(result.start), offsets.char_to_byte(result.end)) else {
                return Err(self.unavailable(format!(
                    "returned a {} span outside the text ({}..{} of {} characters)",
                    entity_type,
                    result.start,
                    result.end,
                    offsets.char_len()
                )));
            };
            candidates.push(Candidate::new(entity_type, start, end, result.score, self.name.as_str()));
        }
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::AnalyzerResult;
    use crate::recognizer::Deadline;
    use anyhow::anyhow;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Returns canned results and records what it was asked for.
    struct CannedAnalyzer {
        results: Vec<AnalyzerResult>,
        seen: Mutex<Vec<Vec<String>>>,
    }

    impl EntityAnalyzer for CannedAnalyzer {
        fn analyze(&self, _text: &str, entity_types: &[EntityType], _language: &str) -> anyhow::Result<Vec<AnalyzerResult>> {
            self.seen
                .lock()
                .unwrap()
                .push(entity_types.iter().map(|e| e.to_string()).collect());
            Ok(self.results.clone())
        }
    }

    struct BrokenAnalyzer;

    impl EntityAnalyzer for BrokenAnalyzer {
        fn analyze(&self, _: &str, _: &[EntityType], _: &str) -> anyhow::Result<Vec<AnalyzerResult>> {
            Err(anyhow!("model not loaded"))
        }
    }

    /// Honors the budget it is given, the way a request timeout would.
    struct BudgetedAnalyzer {
        budgets: Mutex<Vec<Option<Duration>>>,
    }

    impl EntityAnalyzer for BudgetedAnalyzer {
        fn analyze(&self, _: &str, _: &[EntityType], _: &str) -> anyhow::Result<Vec<AnalyzerResult>> {
            Ok(Vec::new())
        }

        fn analyze_within(
            &self,
            _: &str,
            _: &[EntityType],
            _: &str,
            budget: Option<Duration>,
        ) -> anyhow::Result<Vec<AnalyzerResult>> {
            self.budgets.lock().unwrap().push(budget);
            match budget {
                Some(budget) => {
                    std::thread::sleep(budget);
                    Err(anyhow!("operation timed out"))
                }
                None => Ok(Vec::new()),
            }
        }
    }

    fn result(tag: &str, start: usize, end: usize) -> AnalyzerResult {
        AnalyzerResult {
            entity_type: tag.to_string(),
            start,
            end,
            score: 0.85,
        }
    }

    #[test]
    fn test_converts_char_offsets_to_bytes() {
        let analyzer = Arc::new(CannedAnalyzer {
            results: vec![result("PERSON", 2, 6)],
            seen: Mutex::new(Vec::new()),
        });
        let recognizer = NlpRecognizer::new("canned", analyzer.clone(), EntitySet::legal_default());
        let text = "é René signed";
        let found = recognizer
            .analyze(text, &EntitySet::legal_default(), &AnalysisContext::default())
            .unwrap();
        assert_eq!(&text[found[0].start..found[0].end], "René");
    }

    #[test]
    fn test_asks_only_for_requested_types() {
        let analyzer = Arc::new(CannedAnalyzer {
            results: Vec::new(),
            seen: Mutex::new(Vec::new()),
        });
        let recognizer = NlpRecognizer::new("canned", analyzer.clone(), EntitySet::legal_default());
        let requested = EntitySet::parse(["PERSON", "MEDICAL_RECORD"]).unwrap();
        recognizer.analyze("x", &requested, &AnalysisContext::default()).unwrap();
        assert_eq!(analyzer.seen.lock().unwrap()[0], vec!["PERSON".to_string()]);

        let unrelated = EntitySet::parse(["MEDICAL_RECORD"]).unwrap();
        recognizer.analyze("x", &unrelated, &AnalysisContext::default()).unwrap();
        assert_eq!(analyzer.seen.lock().unwrap().len(), 1, "no call without overlap");
    }

    #[test]
    fn test_failures_are_engine_unavailable() {
        let recognizer = NlpRecognizer::new("broken", Arc::new(BrokenAnalyzer), EntitySet::legal_default());
        let err = recognizer
            .analyze("John", &EntitySet::legal_default(), &AnalysisContext::default())
            .unwrap_err();
        assert!(matches!(err, RedactorError::EngineUnavailable(ref m) if m.contains("model not loaded")));
    }

    #[test]
    fn test_out_of_range_span_is_engine_unavailable() {
        let analyzer = Arc::new(CannedAnalyzer {
            results: vec![result("PERSON", 0, 50)],
            seen: Mutex::new(Vec::new()),
        });
        let recognizer = NlpRecognizer::new("canned", analyzer, EntitySet::legal_default());
        let err = recognizer
            .analyze("short", &EntitySet::legal_default(), &AnalysisContext::default())
            .unwrap_err();
        assert!(matches!(err, RedactorError::EngineUnavailable(_)));
        assert!(!err.to_string().contains("short"), "errors never echo the text");
    }

    #[test]
    fn test_analyzer_is_bounded_by_the_detection_deadline() {
        let analyzer = Arc::new(BudgetedAnalyzer {
            budgets: Mutex::new(Vec::new()),
        });
        let recognizer = NlpRecognizer::new("budgeted", analyzer.clone(), EntitySet::legal_default());

        let ctx = AnalysisContext::new(Deadline::after(Duration::from_millis(50)), "en");
        let err = recognizer.analyze("John", &EntitySet::legal_default(), &ctx).unwrap_err();
        assert!(matches!(err, RedactorError::DetectionTimeout { budget_ms: 50 }));

        recognizer
            .analyze("John", &EntitySet::legal_default(), &AnalysisContext::default())
            .unwrap();
        let budgets = analyzer.budgets.lock().unwrap();
        assert!(budgets[0].is_some_and(|b| b <= Duration::from_millis(50)));
        assert_eq!(budgets[1], None);
    }
}
