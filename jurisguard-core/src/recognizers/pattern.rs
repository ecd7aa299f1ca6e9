// jurisguard-core/src/recognizers/pattern.rs
//! A `Recognizer` implementation that uses regular expressions, optional
//! checksum validators and context words to propose PII spans.
//! License: MIT OR APACHE 2.0

use log::trace;
use std::collections::BTreeMap;

use crate::config::ContextConfig;
use crate::entity::{EntitySet, EntityType};
use crate::errors::RedactorError;
use crate::finding::Candidate;
use crate::recognizer::{AnalysisContext, Recognizer};
use crate::recognizers::compiler::CompiledPattern;

/// Matches scanned between two deadline checks.
pub const DEADLINE_CHECK_INTERVAL: usize = 64;

/// Scans text with the compiled patterns of one or more entity types.
#[derive(Debug)]
pub struct PatternRecognizer {
    name: String,
    entities: EntitySet,
    patterns: Vec<CompiledPattern>,
    context: ContextConfig,
}

impl PatternRecognizer {
    pub fn new(name: impl Into<String>, patterns: Vec<CompiledPattern>, context: ContextConfig) -> Self {
        let entities = patterns.iter().map(|p| p.entity_type.clone()).collect();
        Self {
            name: name.into(),
            entities,
            patterns,
            context,
        }
    }

    /// Groups patterns into one recognizer per entity type, in tag order.
    pub fn per_entity(patterns: Vec<CompiledPattern>, context: &ContextConfig) -> Vec<PatternRecognizer> {
        let mut grouped: BTreeMap<EntityType, Vec<CompiledPattern>> = BTreeMap::new();
        for pattern in patterns {
            grouped.entry(pattern.entity_type.clone()).or_default().push(pattern);
        }
        grouped
            .into_iter()
            .map(|(entity, patterns)| {
                let name = format!("pattern:{}", entity.as_str().to_ascii_lowercase());
                PatternRecognizer::new(name, patterns, context.clone())
            })
            .collect()
    }

    pub fn patterns(&self) -> &[CompiledPattern] {
        &self.patterns
    }

    /// Raises `score` when one of the pattern's context words appears within the
    /// window around `start..end`.
    fn enhance_score(&self, text: &str, start: usize, end: usize, pattern: &CompiledPattern) -> f64 {
        if pattern.context.is_empty() || self.context.window == 0 {
            return pattern.score;
        }
        let window = self.context.window;
        let before_start = text[..start]
            .char_indices()
            .rev()
            .take(window)
            .last()
            .map_or(start, |(i, _)| i);
        let after_end = text[end..]
            .char_indices()
            .nth(window)
            .map_or(text.len(), |(i, _)| end + i);

        let surrounding = format!("{} {}", &text[before_start..start], &text[end..after_end]).to_lowercase();
        let found = pattern
            .context
            .iter()
            .any(|word| contains_word(&surrounding, word));
        if !found {
            return pattern.score;
        }
        trace!("Context word found near '{}' match.", pattern.name);
        (pattern.score + self.context.boost)
            .max(self.context.min_score_with_context)
            .min(1.0)
    }
}

/// True if `word` occurs in `haystack` delimited by non-alphanumerics.
fn contains_word(haystack: &str, word: &str) -> bool {
    haystack.match_indices(word).any(|(i, _)| {
        let before_ok = haystack[..i].chars().next_back().map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[i + word.len()..].chars().next().map_or(true, |c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

impl Recognizer for PatternRecognizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn supported_entities(&self) -> &EntitySet {
        &self.entities
    }

    fn analyze(&self, text: &str, entities: &EntitySet, ctx: &AnalysisContext) -> Result<Vec<Candidate>, RedactorError> {
        let mut candidates = Vec::new();

        for pattern in &self.patterns {
            if !entities.contains(&pattern.entity_type) {
                continue;
            }
            ctx.deadline.check()?;
            for (i, m) in pattern.regex.find_iter(text).enumerate() {
                if i % DEADLINE_CHECK_INTERVAL == DEADLINE_CHECK_INTERVAL - 1 {
                    ctx.deadline.check()?;
                }
                if let Some(validator) = pattern.validator {
                    if !validator.validate(m.as_str()) {
                        trace!("Rule '{}' match rejected by {:?} validator.", pattern.name, validator);
                        continue;
                    }
                }
                let score = self.enhance_score(text, m.start(), m.end(), pattern);
                candidates.push(Candidate::new(
                    pattern.entity_type.clone(),
                    m.start(),
                    m.end(),
                    score,
                    self.name.as_str(),
                ));
            }
        }
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_default_patterns, PatternRule};
    use crate::recognizers::compiler::compile_patterns;

    fn default_recognizers() -> Vec<PatternRecognizer> {
        let compiled = compile_patterns(load_default_patterns().unwrap()).unwrap();
        PatternRecognizer::per_entity(compiled, &ContextConfig::default())
    }

    fn scan(text: &str, tag: &str) -> Vec<(String, f64)> {
        let entities = EntitySet::parse([tag]).unwrap();
        let ctx = AnalysisContext::default();
        default_recognizers()
            .iter()
            .filter(|r| r.supported_entities().contains_tag(tag))
            .flat_map(|r| r.analyze(text, &entities, &ctx).unwrap())
            .map(|c| (text[c.start..c.end].to_string(), c.score))
            .collect()
    }

    fn matched(text: &str, tag: &str) -> Vec<String> {
        scan(text, tag).into_iter().map(|(s, _)| s).collect()
    }

    #[test]
    fn test_groups_by_entity_type() {
        let recognizers = default_recognizers();
        let names: Vec<&str> = recognizers.iter().map(|r| r.name()).collect();
        assert!(names.contains(&"pattern:email_address"));
        assert!(names.contains(&"pattern:date_time"));
        for recognizer in &recognizers {
            assert_eq!(recognizer.supported_entities().len(), 1);
        }
    }

    #[test]
    fn test_email_and_phone() {
        let text = "Contact John Smith at john@email.com or 555-123-4567.";
        assert_eq!(matched(text, "EMAIL_ADDRESS"), vec!["john@email.com"]);
        assert_eq!(matched(text, "PHONE_NUMBER"), vec!["555-123-4567"]);
        assert_eq!(matched("Call (555) 123-4567 today", "PHONE_NUMBER"), vec!["(555) 123-4567"]);
    }

    #[test]
    fn test_ssn_validator_rejects_invalid_area() {
        assert_eq!(matched("SSN 123-45-6789", "US_SSN"), vec!["123-45-6789"]);
        assert!(matched("SSN 666-45-6789", "US_SSN").is_empty());
    }

    #[test]
    fn test_credit_card_requires_luhn() {
        assert_eq!(matched("card 4111 1111 1111 1111 on file", "CREDIT_CARD"), vec!["4111 1111 1111 1111"]);
        assert!(matched("card 4111 1111 1111 1112 on file", "CREDIT_CARD").is_empty());
    }

    #[test]
    fn test_iban_forms() {
        assert_eq!(matched("IBAN: DE89370400440532013000.", "IBAN_CODE"), vec!["DE89370400440532013000"]);
        assert!(matched("IBAN: GB82 WEST 1234 5698 7654 32", "IBAN_CODE").contains(&"GB82 WEST 1234 5698 7654 32".to_string()));
    }

    #[test]
    fn test_ip_addresses() {
        assert_eq!(matched("server at 192.168.1.100 responded", "IP_ADDRESS"), vec!["192.168.1.100"]);
        assert!(matched("version 999.1.1.1", "IP_ADDRESS").is_empty());
    }

    #[test]
    fn test_dates() {
        assert_eq!(matched("Signed on January 5, 2024 by", "DATE_TIME"), vec!["January 5, 2024"]);
        assert_eq!(matched("effective 2024-03-01", "DATE_TIME"), vec!["2024-03-01"]);
        assert_eq!(matched("DOB 07/04/1980", "DATE_TIME"), vec!["07/04/1980"]);
    }

    #[test]
    fn test_street_address() {
        let text = "residing at 123 Main Street, Springfield";
        assert_eq!(matched(text, "LOCATION"), vec!["123 Main Street"]);
    }

    #[test]
    fn test_context_boosts_weak_patterns() {
        let bare = scan("Reference 123456789 applies", "US_PASSPORT");
        assert_eq!(bare.len(), 1);
        assert!(bare[0].1 < 0.35);

        let with_context = scan("Passport number: 123456789", "US_PASSPORT");
        assert_eq!(with_context.len(), 1);
        assert!((with_context[0].1 - 0.45).abs() < 1e-9);

        let license = scan("Driver license D1234567 issued", "US_DRIVER_LICENSE");
        assert!((license[0].1 - 0.65).abs() < 1e-9);
    }

    #[test]
    fn test_context_word_must_be_whole_word() {
        assert!(contains_word("my dl is", "dl"));
        assert!(!contains_word("handle this", "dl"));
        assert!(contains_word("social security number", "social security"));
    }

    #[test]
    fn test_skips_entities_not_requested() {
        let compiled = compile_patterns(vec![PatternRule {
            name: "matter".into(),
            entity_type: "MATTER_ID".into(),
            pattern: Some(r"M-\d+".into()),
            score: 0.9,
            ..Default::default()
        }])
        .unwrap();
        let recognizer = PatternRecognizer::new("custom", compiled, ContextConfig::default());
        let ctx = AnalysisContext::default();
        let other = EntitySet::parse(["PERSON"]).unwrap();
        assert!(recognizer.analyze("M-42", &other, &ctx).unwrap().is_empty());
        let wanted = EntitySet::parse(["MATTER_ID"]).unwrap();
        assert_eq!(recognizer.analyze("M-42", &wanted, &ctx).unwrap().len(), 1);
    }

    #[test]
    fn test_expired_deadline_aborts_scan() {
        use crate::recognizer::Deadline;
        use std::time::Duration;

        let ctx = AnalysisContext::new(Deadline::after(Duration::ZERO), "en");
        let entities = EntitySet::legal_default();
        let recognizer = &default_recognizers()[0];
        let result = recognizer.analyze("text", &entities, &ctx);
        assert!(matches!(result, Err(RedactorError::DetectionTimeout { .. })));
    }
}
