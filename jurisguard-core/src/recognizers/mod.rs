// jurisguard-core/src/recognizers/mod.rs
//! Built-in recognizers and the adapters for external analyzers.
//! License: MIT OR APACHE 2.0

pub mod compiler;
pub mod gazetteer;
pub mod http;
pub mod nlp;
pub mod pattern;

pub use compiler::{compile_patterns, CompiledPattern};
pub use gazetteer::{LocationRecognizer, PersonRecognizer};
pub use http::HttpAnalyzer;
pub use nlp::NlpRecognizer;
pub use pattern::PatternRecognizer;

use log::debug;

use crate::config::RedactorConfig;
use crate::errors::RedactorError;
use crate::recognizer::Recognizer;

/// Builds the bundled recognizer pool for `config`: one pattern recognizer per
/// entity type plus the PERSON and LOCATION gazetteers.
///
/// Custom pattern rules from the configuration are compiled even when the
/// bundled recognizers are switched off.
pub fn build_recognizers(config: &RedactorConfig) -> Result<Vec<Box<dyn Recognizer>>, RedactorError> {
    let patterns = compile_patterns(config.effective_patterns()?)?;
    let mut pool: Vec<Box<dyn Recognizer>> = PatternRecognizer::per_entity(patterns, &config.context)
        .into_iter()
        .map(|r| Box::new(r) as Box<dyn Recognizer>)
        .collect();

    if config.builtin_recognizers {
        pool.push(Box::new(PersonRecognizer::new()));
        pool.push(Box::new(LocationRecognizer::new()?));
    }
    debug!(
        "Built {} recognizer(s): {}",
        pool.len(),
        pool.iter().map(|r| r.name()).collect::<Vec<_>>().join(", ")
    );
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PatternRule;

    #[test]
    fn test_default_pool_covers_legal_entities() {
        let pool = build_recognizers(&RedactorConfig::default()).unwrap();
        for tag in crate::entity::LEGAL_PII_ENTITIES {
            assert!(
                pool.iter().any(|r| r.supported_entities().contains_tag(tag)),
                "no recognizer for {}",
                tag
            );
        }
    }

    #[test]
    fn test_custom_patterns_without_builtins() {
        let config = RedactorConfig {
            builtin_recognizers: false,
            patterns: vec![PatternRule {
                name: "matter_number".into(),
                entity_type: "MATTER_NUMBER".into(),
                pattern: Some(r"\bMAT-\d{6}\b".into()),
                score: 0.9,
                ..Default::default()
            }],
            ..Default::default()
        };
        let pool = build_recognizers(&config).unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].name(), "pattern:matter_number");
    }
}
