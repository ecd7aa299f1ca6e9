//! compiler.rs - Compiles pattern rules into ready-to-scan form.
//!
//! Converts validated [`PatternRule`]s into [`CompiledPattern`]s: the regex is
//! built with a size limit, the entity tag is parsed and context words are
//! normalized. All failures are collected so that one bad configuration file
//! reports every broken rule at once.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, warn};
use regex::{Regex, RegexBuilder};

use crate::config::{PatternRule, MAX_PATTERN_LENGTH};
use crate::entity::EntityType;
use crate::errors::RedactorError;
use crate::validators::Validator;

/// Upper bound on the compiled program size of a single pattern.
const REGEX_SIZE_LIMIT: usize = 10 * (1 << 20);

/// A single compiled pattern rule.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// The unique name of the rule.
    pub name: String,
    pub entity_type: EntityType,
    /// The compiled regular expression used for matching.
    pub regex: Regex,
    pub score: f64,
    pub validator: Option<Validator>,
    /// Lower-cased context words.
    pub context: Vec<String>,
}

/// Compiles a list of `PatternRule`s.
pub fn compile_patterns(rules: Vec<PatternRule>) -> Result<Vec<CompiledPattern>, RedactorError> {
    debug!("Starting compilation of {} pattern rules.", rules.len());

    let mut compiled = Vec::new();
    let mut compilation_errors = Vec::new();

    for rule in rules {
        let Some(pattern) = rule.pattern.as_ref() else {
            warn!("Skipping rule '{}' because its pattern is missing.", &rule.name);
            continue;
        };

        if pattern.len() > MAX_PATTERN_LENGTH {
            compilation_errors.push(RedactorError::PatternLengthExceeded(
                rule.name,
                pattern.len(),
                MAX_PATTERN_LENGTH,
            ));
            continue;
        }

        let entity_type = match EntityType::new(&rule.entity_type) {
            Ok(entity_type) => entity_type,
            Err(e) => {
                compilation_errors.push(RedactorError::Config(format!("rule '{}': {}", rule.name, e)));
                continue;
            }
        };

        let regex_result = RegexBuilder::new(pattern)
            .case_insensitive(rule.case_insensitive)
            .multi_line(rule.multiline)
            .size_limit(REGEX_SIZE_LIMIT)
            .build();

        match regex_result {
            Ok(regex) => {
                debug!(
                    target: "jurisguard_core::recognizers",
                    "Rule '{}' compiled successfully.",
                    &rule.name
                );
                compiled.push(CompiledPattern {
                    name: rule.name,
                    entity_type,
                    regex,
                    score: rule.score.clamp(0.0, 1.0),
                    validator: rule.validator,
                    context: rule
                        .context
                        .iter()
                        .map(|word| word.trim().to_lowercase())
                        .filter(|word| !word.is_empty())
                        .collect(),
                });
            }
            Err(e) => {
                compilation_errors.push(RedactorError::PatternCompilation(rule.name, e));
            }
        }
    }

    if !compilation_errors.is_empty() {
        let error_message = compilation_errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<String>>()
            .join("\n");
        return Err(RedactorError::Config(format!(
            "Failed to compile {} pattern rule(s):\n{}",
            compilation_errors.len(),
            error_message
        )));
    }

    debug!("Finished compiling patterns. Total compiled: {}.", compiled.len());
    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_default_patterns;

    #[test]
    fn test_compiles_default_patterns() {
        let compiled = compile_patterns(load_default_patterns().unwrap()).unwrap();
        let ssn = compiled.iter().find(|p| p.name == "us_ssn").unwrap();
        assert_eq!(ssn.entity_type.as_str(), "US_SSN");
        assert_eq!(ssn.validator, Some(Validator::UsSsn));
        assert!(ssn.regex.is_match("SSN 123-45-6789"));
    }

    #[test]
    fn test_collects_all_failures() {
        let rules = vec![
            PatternRule {
                name: "broken".into(),
                entity_type: "X".into(),
                pattern: Some("(".into()),
                ..Default::default()
            },
            PatternRule {
                name: "long".into(),
                entity_type: "X".into(),
                pattern: Some("a".repeat(MAX_PATTERN_LENGTH + 1)),
                ..Default::default()
            },
        ];
        let message = compile_patterns(rules).unwrap_err().to_string();
        assert!(message.contains("Failed to compile 2 pattern rule(s)"));
        assert!(message.contains("'broken'"));
        assert!(message.contains("'long'"));
    }

    #[test]
    fn test_case_insensitive_and_context_normalization() {
        let compiled = compile_patterns(vec![PatternRule {
            name: "matter".into(),
            entity_type: "matter_id".into(),
            pattern: Some(r"\bmatter-\d{4}\b".into()),
            case_insensitive: true,
            context: vec!["  Docket ".into(), "".into()],
            ..Default::default()
        }])
        .unwrap();
        assert!(compiled[0].regex.is_match("MATTER-2024"));
        assert_eq!(compiled[0].entity_type.as_str(), "MATTER_ID");
        assert_eq!(compiled[0].context, vec!["docket".to_string()]);
    }
}
