//! errors.rs - Error types for the jurisguard-core library.
//!
//! Every failure of the redaction pipeline surfaces as a `RedactorError`. None of
//! these variants is ever converted into a "return the original text" result:
//! callers decide whether a document may proceed downstream.
//!
//! Messages carry entity types, counts and causes only. They never embed matched
//! values or the text surrounding them.
//!
//! License: MIT OR APACHE 2.0

use thiserror::Error;

/// All error kinds produced by `jurisguard-core`.
///
/// The enum is `Clone` so that a single initialization failure can be handed to
/// every caller that was waiting on it (see `lifecycle`).
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum RedactorError {
    /// The detection capability failed to initialize, crashed, or returned
    /// unusable output.
    #[error("PII detection engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Analysis exceeded the configured time budget.
    #[error("PII detection exceeded the configured timeout of {budget_ms} ms")]
    DetectionTimeout { budget_ms: u64 },

    /// Anonymization failed after a successful detection pass.
    #[error("PII redaction failed: {0}")]
    RedactionFailed(String),

    /// Malformed request input, e.g. an invalid entity allowlist entry.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to compile recognizer pattern '{0}': {1}")]
    PatternCompilation(String, regex::Error),

    #[error("Pattern '{0}': length ({1}) exceeds maximum allowed ({2})")]
    PatternLengthExceeded(String, usize, usize),
}

impl RedactorError {
    /// Short, stable label for logs and CLI exit reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            RedactorError::EngineUnavailable(_) => "EngineUnavailable",
            RedactorError::DetectionTimeout { .. } => "DetectionTimeout",
            RedactorError::RedactionFailed(_) => "RedactionFailed",
            RedactorError::InvalidInput(_) => "InvalidInput",
            RedactorError::Config(_) => "Config",
            RedactorError::PatternCompilation(..) => "PatternCompilation",
            RedactorError::PatternLengthExceeded(..) => "PatternLengthExceeded",
        }
    }

    /// Folds construction-time errors into `EngineUnavailable`, the kind callers
    /// see when the engine could not be built.
    pub fn into_engine_unavailable(self) -> Self {
        match self {
            RedactorError::EngineUnavailable(_) => self,
            other => RedactorError::EngineUnavailable(other.to_string()),
        }
    }
}
