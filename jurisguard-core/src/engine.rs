// jurisguard-core/src/engine.rs
//! The assembled redaction engine and its builder.
//!
//! An [`EngineHandle`] owns the recognizer pool (through the [`Detector`]), the
//! [`PolicyStore`] and the defaults applied to each call. It is immutable once
//! built and safe to share across threads; all per-call state lives on the
//! stack of the calling thread.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;

use crate::audit::{report, AuditRecord, AuditReport};
use crate::config::RedactorConfig;
use crate::detector::Detector;
use crate::entity::EntitySet;
use crate::errors::RedactorError;
use crate::finding::Finding;
use crate::policy::PolicyStore;
use crate::recognizer::{Deadline, EntityAnalyzer, Recognizer};
use crate::recognizers::{build_recognizers, HttpAnalyzer, NlpRecognizer};
use crate::redaction::{redact, Redaction};

#[derive(Debug)]
pub struct EngineHandle {
    detector: Detector,
    policy: PolicyStore,
    default_entities: EntitySet,
    timeout: Option<Duration>,
}

impl EngineHandle {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Builds an engine from a resolved configuration.
    pub fn from_config(config: &RedactorConfig) -> Result<Self, RedactorError> {
        EngineBuilder::new().with_config(config.clone()).build()
    }

    /// The allowlist used when a call does not name one.
    pub fn default_entities(&self) -> &EntitySet {
        &self.default_entities
    }

    /// Detection budget per call.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn policy(&self) -> &PolicyStore {
        &self.policy
    }

    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    fn resolve_entities(&self, entities: Option<&[&str]>) -> Result<EntitySet, RedactorError> {
        EntitySet::resolve_request(entities, &self.default_entities)
    }

    /// Detects PII in `text`. `None` or an empty list uses the default allowlist.
    pub fn analyze(&self, text: &str, entities: Option<&[&str]>) -> Result<Vec<Finding>, RedactorError> {
        let entities = self.resolve_entities(entities)?;
        self.detect(text, &entities)
    }

    /// Detects PII of an already resolved allowlist.
    pub fn detect(&self, text: &str, entities: &EntitySet) -> Result<Vec<Finding>, RedactorError> {
        self.detector.detect(text, entities, Deadline::from_option(self.timeout))
    }

    /// Detects and redacts PII, returning the sanitized text with per-type counts.
    ///
    /// Empty or whitespace-only input yields empty output without detection.
    pub fn secure(&self, text: &str, entities: Option<&[&str]>) -> Result<Redaction, RedactorError> {
        if text.trim().is_empty() {
            return Ok(Redaction {
                text: String::new(),
                entity_counts: Default::default(),
            });
        }
        let findings = self.analyze(text, entities)?;
        redact(text, &findings, &self.policy)
    }

    pub fn secure_text(&self, text: &str, entities: Option<&[&str]>) -> Result<String, RedactorError> {
        self.secure(text, entities).map(|redaction| redaction.text)
    }

    /// Detects PII and returns audit records only; the text is not modified.
    ///
    /// Empty or whitespace-only input yields no records without detection.
    pub fn analyze_only(&self, text: &str, entities: Option<&[&str]>) -> Result<Vec<AuditRecord>, RedactorError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(report(&self.analyze(text, entities)?))
    }

    /// Detects PII and wraps the records in a timestamped report.
    pub fn audit(&self, text: &str, entities: Option<&[&str]>) -> Result<AuditReport, RedactorError> {
        let findings = self.analyze(text, entities)?;
        Ok(AuditReport::new(text, &findings))
    }
}

/// Assembles an [`EngineHandle`] from configuration plus injected parts.
#[derive(Default)]
pub struct EngineBuilder {
    config: RedactorConfig,
    recognizers: Vec<Box<dyn Recognizer>>,
    analyzers: Vec<(String, Arc<dyn EntityAnalyzer>)>,
    policy: Option<PolicyStore>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: RedactorConfig) -> Self {
        self.config = config;
        self
    }

    /// Adds a recognizer to the pool.
    pub fn with_recognizer<R: Recognizer + 'static>(mut self, recognizer: R) -> Self {
        self.recognizers.push(Box::new(recognizer));
        self
    }

    /// Adds an NLP capability; it is asked for the default allowlist's types.
    pub fn with_analyzer(mut self, name: impl Into<String>, analyzer: Arc<dyn EntityAnalyzer>) -> Self {
        self.analyzers.push((name.into(), analyzer));
        self
    }

    /// Leaves out the bundled pattern and gazetteer recognizers.
    pub fn without_builtin_recognizers(mut self) -> Self {
        self.config.builtin_recognizers = false;
        self
    }

    /// Replaces the configured policy entirely.
    pub fn with_policy(mut self, policy: PolicyStore) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.detection_timeout_ms = timeout.map(|t| t.as_millis().max(1) as u64);
        self
    }

    pub fn with_score_threshold(mut self, threshold: f64) -> Self {
        self.config.score_threshold = threshold;
        self
    }

    pub fn with_default_entities<S: AsRef<str>>(mut self, entities: &[S]) -> Self {
        self.config.entities = entities.iter().map(|e| e.as_ref().to_string()).collect();
        self
    }

    pub fn build(self) -> Result<EngineHandle, RedactorError> {
        let EngineBuilder {
            config,
            recognizers: extra,
            analyzers,
            policy,
        } = self;
        config.validate()?;

        let default_entities = config.default_entities()?;
        let analyzer_entities: EntitySet = EntitySet::legal_default()
            .iter()
            .chain(default_entities.iter())
            .cloned()
            .collect::<EntitySet>();

        let mut recognizers = build_recognizers(&config)?;
        if let Some(http) = HttpAnalyzer::from_config(&config.analyzer)? {
            recognizers.push(Box::new(NlpRecognizer::new(
                "analyzer:http",
                Arc::new(http),
                analyzer_entities.clone(),
            )));
        }
        for (name, analyzer) in analyzers {
            recognizers.push(Box::new(NlpRecognizer::new(name, analyzer, analyzer_entities.clone())));
        }
        recognizers.extend(extra);
        if recognizers.is_empty() {
            return Err(RedactorError::EngineUnavailable(
                "no recognizers configured: enable the built-in recognizers or add one".to_string(),
            ));
        }

        let policy = match policy {
            Some(policy) => policy,
            None => PolicyStore::from_config(&config.policy, config.hash_salt.as_deref())?,
        };
        let detector = Detector::new(recognizers)
            .with_score_threshold(config.score_threshold)
            .with_language(config.language.as_str());
        debug!("Recognizer pool: {}", detector.recognizer_names().join(", "));

        let timeout = config.detection_timeout_ms.map(Duration::from_millis);
        info!(
            "PII engine ready: {} recognizer(s), {} default entity type(s), timeout {}.",
            detector.recognizer_names().len(),
            default_entities.len(),
            timeout.map_or_else(|| "none".to_string(), |t| format!("{} ms", t.as_millis()))
        );

        Ok(EngineHandle {
            detector,
            policy,
            default_entities,
            timeout,
        })
    }
}

/// Builds the allowlist a request names, for callers holding owned strings.
pub fn entity_refs(entities: &Option<Vec<String>>) -> Option<Vec<&str>> {
    entities
        .as_ref()
        .map(|list| list.iter().map(String::as_str).collect())
}
