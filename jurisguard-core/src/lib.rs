// jurisguard-core/src/lib.rs
//! # JurisGuard Core Library
//!
//! `jurisguard-core` detects personally identifiable information in document
//! text and replaces it with policy-defined placeholders before the text moves
//! further down a processing pipeline. It is built for legal documents: the
//! default entity allowlist and placeholders (`<PARTY>`, `<SSN_REDACTED>`,
//! `<BANK_ACCOUNT>`, ...) reflect that domain.
//!
//! The pipeline is fail-closed. Every failure of detection or redaction is an
//! error; the unredacted input is never returned in place of a result.
//!
//! ## Modules
//!
//! * `entity`: Entity type tags and allowlists.
//! * `recognizer`: The `Recognizer` trait and the injected `EntityAnalyzer` contract.
//! * `recognizers`: Pattern, checksum and gazetteer recognizers, plus the NLP and HTTP adapters.
//! * `detector`: Runs the recognizer pool and merges candidates into non-overlapping findings.
//! * `policy`: Replacement rules (literal, mask, keyed hash) per entity type.
//! * `redaction`: Applies a policy to findings, atomically.
//! * `audit`: Text-free projections of findings for auditors.
//! * `engine`: The assembled `EngineHandle` and its builder.
//! * `lifecycle`: Single-flight construction of the process-wide engine.
//! * `api`: One-shot sync and async entry points.
//! * `config`: YAML configuration, embedded defaults and environment overrides.
//!
//! ## Usage Example
//!
//! ```rust
//! use jurisguard_core::{EngineHandle, RedactorError};
//!
//! fn main() -> Result<(), RedactorError> {
//!     let engine = EngineHandle::builder().build()?;
//!     let sanitized = engine.secure_text("Contact John Smith at john@email.com or 555-123-4567.", None)?;
//!     assert_eq!(sanitized, "Contact <PARTY> at <EMAIL> or <PHONE>.");
//!
//!     let records = engine.analyze_only("Mail jane@firm.com", Some(&["EMAIL_ADDRESS"]))?;
//!     assert_eq!(records.len(), 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library operations return [`RedactorError`]. Construction problems reach
//! callers of the shared engine as `EngineUnavailable`; detection reports
//! `EngineUnavailable` or `DetectionTimeout`; anonymization reports
//! `RedactionFailed`; bad allowlists report `InvalidInput`.
//!
//! ---
//! License: MIT OR APACHE 2.0

pub mod api;
pub mod audit;
pub mod config;
pub mod detector;
pub mod engine;
pub mod entity;
pub mod errors;
pub mod finding;
pub mod lifecycle;
pub mod offsets;
pub mod policy;
pub mod recognizer;
pub mod recognizers;
pub mod redaction;
pub mod validators;

/// Re-exports the configuration types and loaders.
pub use config::{
    load_default_patterns,
    merge_patterns,
    AnalyzerConfig,
    ContextConfig,
    PatternRule,
    PolicyConfig,
    RedactorConfig,
    DEFAULT_SCORE_THRESHOLD,
    MAX_PATTERN_LENGTH,
};

pub use errors::RedactorError;

pub use entity::{EntitySet, EntityType, LEGAL_PII_ENTITIES};

pub use finding::{Candidate, Finding};

/// Re-exports the recognizer contracts and the built-in implementations.
pub use recognizer::{AnalysisContext, AnalyzerResult, Deadline, EntityAnalyzer, Recognizer};
pub use recognizers::{HttpAnalyzer, LocationRecognizer, NlpRecognizer, PatternRecognizer, PersonRecognizer};

pub use detector::{resolve_overlaps, Detector};

pub use policy::{PolicyStore, ReplacementRule};

pub use redaction::{redact, Redaction};

pub use audit::{report, AuditRecord, AuditReport};

pub use engine::{EngineBuilder, EngineHandle};

/// Re-exports the process-wide engine lifecycle.
pub use lifecycle::{engine_state, get_engine, init_engine, LifecycleState};

/// Re-exports the one-shot entry points.
pub use api::{analyze_only, analyze_only_async, secure_text, secure_text_async};
