// jurisguard-core/src/api.rs
//! One-shot entry points over the process-wide engine, plus async variants for
//! callers running inside a tokio runtime.
//!
//! The sync functions build the shared engine on first use (see `lifecycle`).
//! The async functions take an explicit handle, run the blocking pipeline on
//! tokio's blocking pool and bound the wait by the handle's detection timeout.

use std::sync::Arc;

use crate::audit::AuditRecord;
use crate::engine::{entity_refs, EngineHandle};
use crate::errors::RedactorError;
use crate::lifecycle::get_engine;

/// Detects and redacts PII in `text` using the process-wide engine.
///
/// Empty or whitespace-only input returns an empty string without touching
/// the engine. Any failure is returned as an error; the input is never handed
/// back in its place.
pub fn secure_text(text: &str, entities: Option<&[&str]>) -> Result<String, RedactorError> {
    if text.trim().is_empty() {
        return Ok(String::new());
    }
    get_engine()?.secure_text(text, entities)
}

/// Detects PII in `text` using the process-wide engine and returns audit
/// records without modifying the text.
///
/// Empty or whitespace-only input returns no records without touching the
/// engine.
pub fn analyze_only(text: &str, entities: Option<&[&str]>) -> Result<Vec<AuditRecord>, RedactorError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    get_engine()?.analyze_only(text, entities)
}

async fn run_blocking<T, F>(engine: Arc<EngineHandle>, job: F) -> Result<T, RedactorError>
where
    T: Send + 'static,
    F: FnOnce(&EngineHandle) -> Result<T, RedactorError> + Send + 'static,
{
    let budget = engine.timeout();
    let task = tokio::task::spawn_blocking(move || job(&engine));
    let joined = match budget {
        // The blocking task keeps its own cooperative deadline; this bounds
        // only how long the caller waits for it.
        Some(budget) => tokio::time::timeout(budget, task)
            .await
            .map_err(|_| RedactorError::DetectionTimeout {
                budget_ms: budget.as_millis() as u64,
            })?,
        None => task.await,
    };
    joined.map_err(|e| RedactorError::RedactionFailed(format!("redaction task did not complete: {}", e)))?
}

/// Async form of [`EngineHandle::secure_text`].
pub async fn secure_text_async(
    engine: Arc<EngineHandle>,
    text: String,
    entities: Option<Vec<String>>,
) -> Result<String, RedactorError> {
    if text.trim().is_empty() {
        return Ok(String::new());
    }
    run_blocking(engine, move |engine| {
        let refs = entity_refs(&entities);
        engine.secure_text(&text, refs.as_deref())
    })
    .await
}

/// Async form of [`EngineHandle::analyze_only`].
pub async fn analyze_only_async(
    engine: Arc<EngineHandle>,
    text: String,
    entities: Option<Vec<String>>,
) -> Result<Vec<AuditRecord>, RedactorError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    run_blocking(engine, move |engine| {
        let refs = entity_refs(&entities);
        engine.analyze_only(&text, refs.as_deref())
    })
    .await
}
