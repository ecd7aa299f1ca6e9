//! Configuration management for `jurisguard-core`.
//!
//! This module defines the YAML-backed configuration of the redactor: the entity
//! allowlist, detection timeout and score threshold, recognizer pattern rules,
//! the optional external analyzer and replacement policy overrides. It handles
//! loading the embedded defaults, merging user files over them, applying
//! `JURISGUARD_*` environment overrides and validating the result.
//!
//! License: MIT OR Apache-2.0

use anyhow::{Context, Result};
use log::{debug, info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use crate::entity::{EntitySet, EntityType};
use crate::errors::RedactorError;
use crate::policy::ReplacementRule;
use crate::validators::Validator;

/// Maximum allowed length for a regex pattern string.
pub const MAX_PATTERN_LENGTH: usize = 500;

/// Default minimum score a candidate needs to become a finding.
pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.35;

pub const ENV_CONFIG: &str = "JURISGUARD_CONFIG";
pub const ENV_ENTITIES: &str = "JURISGUARD_ENTITIES";
pub const ENV_HASH_SALT: &str = "JURISGUARD_HASH_SALT";
pub const ENV_DETECTION_TIMEOUT_MS: &str = "JURISGUARD_DETECTION_TIMEOUT_MS";
pub const ENV_SCORE_THRESHOLD: &str = "JURISGUARD_SCORE_THRESHOLD";
pub const ENV_ANALYZER_URL: &str = "JURISGUARD_ANALYZER_URL";
pub const ENV_LOG: &str = "JURISGUARD_LOG";

/// A single pattern rule used by the built-in pattern recognizers.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PatternRule {
    /// Unique identifier for the rule (e.g., "us_ssn").
    pub name: String,
    /// Entity type tag reported for matches.
    pub entity_type: String,
    /// Human-readable description of what the rule targets.
    pub description: Option<String>,
    /// The regex pattern string.
    pub pattern: Option<String>,
    /// Base confidence of a match, in [0, 1].
    pub score: f64,
    /// Optional checksum/structure check a match must pass.
    pub validator: Option<Validator>,
    /// Words that raise the score when found near a match.
    pub context: Vec<String>,
    pub case_insensitive: bool,
    /// If true, enables multiline mode for the regex engine.
    pub multiline: bool,
    /// Explicit override for enabling/disabling the rule.
    pub enabled: Option<bool>,
}

impl Default for PatternRule {
    fn default() -> Self {
        Self {
            name: String::new(),
            entity_type: String::new(),
            description: None,
            pattern: None,
            score: 0.5,
            validator: None,
            context: Vec::new(),
            case_insensitive: false,
            multiline: false,
            enabled: None,
        }
    }
}

/// Context enhancement settings shared by all pattern rules.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Characters inspected on each side of a match.
    pub window: usize,
    /// Amount added to a match's score when a context word is present.
    pub boost: f64,
    /// Floor applied to a context-enhanced score.
    pub min_score_with_context: f64,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            window: 40,
            boost: 0.35,
            min_score_with_context: 0.4,
        }
    }
}

/// Settings for an external Presidio-compatible analyzer service.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Base URL, e.g. `http://localhost:5002`. `None` disables the analyzer.
    pub endpoint: Option<String>,
    /// Per-request timeout.
    pub timeout_ms: u64,
    /// Probe `GET /health` while the engine is built.
    pub health_check: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_ms: 5_000,
            health_check: true,
        }
    }
}

/// Replacement policy overrides, merged over the embedded default policy.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Rule for entity types without an entry of their own.
    pub default: Option<ReplacementRule>,
    /// Per entity type rules, keyed by tag.
    pub entities: BTreeMap<String, ReplacementRule>,
}

/// The built-in pattern rule set as stored in `config/default_recognizers.yaml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PatternSet {
    pub patterns: Vec<PatternRule>,
}

/// Top-level configuration of the redactor.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RedactorConfig {
    /// Default entity allowlist. Empty means the legal-domain default.
    pub entities: Vec<String>,
    /// Language code passed to recognizers and the external analyzer.
    pub language: String,
    pub score_threshold: f64,
    /// Detection budget per call. `None` means unbounded.
    pub detection_timeout_ms: Option<u64>,
    /// Key for `hash` replacement rules. A random per-process salt is used when unset.
    #[serde(skip_serializing)]
    pub hash_salt: Option<String>,
    /// Log filter for the CLI (e.g. "info", "jurisguard_core=debug").
    pub log_level: Option<String>,
    /// Whether the bundled pattern and gazetteer recognizers are loaded.
    pub builtin_recognizers: bool,
    /// Additional pattern rules; a rule with the name of a built-in one replaces it.
    pub patterns: Vec<PatternRule>,
    pub context: ContextConfig,
    pub analyzer: AnalyzerConfig,
    pub policy: PolicyConfig,
}

impl Default for RedactorConfig {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            language: "en".to_string(),
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            detection_timeout_ms: None,
            hash_salt: None,
            log_level: None,
            builtin_recognizers: true,
            patterns: Vec::new(),
            context: ContextConfig::default(),
            analyzer: AnalyzerConfig::default(),
            policy: PolicyConfig::default(),
        }
    }
}

impl RedactorConfig {
    /// Loads and validates a configuration from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: RedactorConfig = serde_yml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        info!(
            "Loaded configuration with {} custom pattern(s) and {} policy override(s) from {}.",
            config.patterns.len(),
            config.policy.entities.len(),
            path.display()
        );
        Ok(config)
    }

    /// Resolves the effective configuration.
    ///
    /// The file is `explicit` if given, else `$JURISGUARD_CONFIG`, else the first
    /// existing default location; without any file the built-in defaults apply.
    /// Environment overrides are applied last.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var_os(ENV_CONFIG).map(PathBuf::from);
        let path = explicit
            .map(Path::to_path_buf)
            .or(env_path)
            .or_else(|| default_config_paths().into_iter().find(|p| p.is_file()));

        let mut config = match path {
            Some(path) => Self::load_from_file(&path)?,
            None => {
                debug!("No configuration file found; using built-in defaults.");
                Self::default()
            }
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Applies `JURISGUARD_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), RedactorError> {
        self.apply_env_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides read through `lookup`, then re-validates.
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F) -> Result<(), RedactorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(list) = lookup(ENV_ENTITIES) {
            debug!("Overriding entity allowlist from {}.", ENV_ENTITIES);
            self.entities = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(salt) = lookup(ENV_HASH_SALT) {
            debug!("Overriding hash salt from {}.", ENV_HASH_SALT);
            self.hash_salt = Some(salt);
        }
        if let Some(raw) = lookup(ENV_DETECTION_TIMEOUT_MS) {
            let ms = raw.trim().parse::<u64>().map_err(|_| {
                RedactorError::Config(format!("{} must be a whole number of milliseconds", ENV_DETECTION_TIMEOUT_MS))
            })?;
            self.detection_timeout_ms = if ms == 0 { None } else { Some(ms) };
        }
        if let Some(raw) = lookup(ENV_SCORE_THRESHOLD) {
            self.score_threshold = raw
                .trim()
                .parse::<f64>()
                .map_err(|_| RedactorError::Config(format!("{} must be a number", ENV_SCORE_THRESHOLD)))?;
        }
        if let Some(url) = lookup(ENV_ANALYZER_URL) {
            let url = url.trim();
            self.analyzer.endpoint = if url.is_empty() { None } else { Some(url.to_string()) };
        }
        if let Some(level) = lookup(ENV_LOG) {
            self.log_level = Some(level);
        }
        self.validate()
    }

    /// Checks every field that can be checked without building the engine.
    pub fn validate(&self) -> Result<(), RedactorError> {
        let mut errors = Vec::new();

        if let Err(e) = self.default_entities() {
            errors.push(e.to_string());
        }
        if !(0.0..=1.0).contains(&self.score_threshold) {
            errors.push(format!("score_threshold must be within [0, 1], got {}", self.score_threshold));
        }
        if self.detection_timeout_ms == Some(0) {
            errors.push("detection_timeout_ms must be positive; omit it for no timeout".to_string());
        }
        if !(0.0..=1.0).contains(&self.context.boost) || !(0.0..=1.0).contains(&self.context.min_score_with_context) {
            errors.push("context boost and min_score_with_context must be within [0, 1]".to_string());
        }
        if let Some(endpoint) = &self.analyzer.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                errors.push(format!("analyzer endpoint '{}' must be an http(s) URL", endpoint));
            }
        }
        if let Some(rule) = &self.policy.default {
            if let Err(e) = rule.validate() {
                errors.push(format!("policy default: {}", e));
            }
        }
        for (tag, rule) in &self.policy.entities {
            if let Err(e) = EntityType::new(tag) {
                errors.push(format!("policy entry '{}': {}", tag, e));
            }
            if let Err(e) = rule.validate() {
                errors.push(format!("policy entry '{}': {}", tag, e));
            }
        }
        if let Err(e) = validate_patterns(&self.patterns) {
            errors.push(e.to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(RedactorError::Config(errors.join("; ")))
        }
    }

    /// The allowlist used when a request does not name one.
    pub fn default_entities(&self) -> Result<EntitySet, RedactorError> {
        if self.entities.is_empty() {
            return Ok(EntitySet::legal_default());
        }
        EntitySet::parse(&self.entities).map_err(|e| RedactorError::Config(format!("entities: {}", e)))
    }

    /// The built-in pattern rules with this configuration's rules merged over them.
    pub fn effective_patterns(&self) -> Result<Vec<PatternRule>, RedactorError> {
        let defaults = if self.builtin_recognizers {
            load_default_patterns()?
        } else {
            Vec::new()
        };
        Ok(merge_patterns(defaults, self.patterns.clone()))
    }
}

/// Loads the default pattern rules from the embedded configuration.
pub fn load_default_patterns() -> Result<Vec<PatternRule>, RedactorError> {
    debug!("Loading default recognizer patterns from embedded string...");
    let default_yaml = include_str!("../config/default_recognizers.yaml");
    let set: PatternSet = serde_yml::from_str(default_yaml)
        .map_err(|e| RedactorError::Config(format!("Failed to parse default recognizer patterns: {}", e)))?;
    debug!("Loaded {} default patterns.", set.patterns.len());
    Ok(set.patterns)
}

/// Merges user pattern rules over the defaults by name.
///
/// Default order is kept; new user rules are appended. Rules with
/// `enabled: false` are dropped after the merge.
pub fn merge_patterns(defaults: Vec<PatternRule>, user: Vec<PatternRule>) -> Vec<PatternRule> {
    debug!(
        "merge_patterns called with {} default and {} user rules.",
        defaults.len(),
        user.len()
    );
    let mut merged = defaults;
    for rule in user {
        match merged.iter_mut().find(|existing| existing.name == rule.name) {
            Some(existing) => {
                debug!("User rule '{}' replaces the built-in rule.", rule.name);
                *existing = rule;
            }
            None => merged.push(rule),
        }
    }
    merged.retain(|rule| {
        let keep = rule.enabled != Some(false);
        if !keep {
            debug!("Pattern rule '{}' is disabled.", rule.name);
        }
        keep
    });
    debug!("Final pattern count after merge: {}", merged.len());
    merged
}

/// Validates rule integrity: names, entity tags, scores and regex syntax.
pub fn validate_patterns(rules: &[PatternRule]) -> Result<(), RedactorError> {
    let mut rule_names = HashSet::new();
    let mut errors = Vec::new();

    for rule in rules {
        if rule.name.is_empty() {
            errors.push("A pattern rule has an empty `name` field.".to_string());
        } else if !rule_names.insert(rule.name.as_str()) {
            errors.push(format!("Duplicate pattern rule name found: '{}'.", rule.name));
        }

        if rule.enabled == Some(false) {
            continue;
        }

        if let Err(e) = EntityType::new(&rule.entity_type) {
            errors.push(format!("Rule '{}': {}", rule.name, e));
        }
        if !(0.0..=1.0).contains(&rule.score) {
            errors.push(format!("Rule '{}': score must be within [0, 1], got {}", rule.name, rule.score));
        }

        let Some(pattern) = &rule.pattern else {
            errors.push(format!("Rule '{}' is missing the `pattern` field.", rule.name));
            continue;
        };
        if pattern.is_empty() {
            errors.push(format!("Rule '{}' has an empty `pattern` field.", rule.name));
        } else if pattern.len() > MAX_PATTERN_LENGTH {
            errors.push(format!(
                "Rule '{}': pattern length ({}) exceeds maximum allowed ({})",
                rule.name,
                pattern.len(),
                MAX_PATTERN_LENGTH
            ));
        } else if let Err(e) = Regex::new(pattern) {
            errors.push(format!("Rule '{}' has an invalid regex pattern: {}", rule.name, e));
        }
        if rule.context.iter().any(|word| word.trim().is_empty()) {
            warn!("Rule '{}' lists an empty context word; it is ignored.", rule.name);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(RedactorError::Config(format!(
            "Pattern validation failed:\n{}",
            errors.join("\n")
        )))
    }
}

/// Candidate locations of the configuration file, in lookup order.
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".jurisguard").join("config.yaml"));
    }
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("jurisguard").join("config.yaml"));
    }
    paths.push(PathBuf::from("/etc/jurisguard/config.yaml"));
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn rule(name: &str, pattern: &str) -> PatternRule {
        PatternRule {
            name: name.to_string(),
            entity_type: "EMPLOYEE_ID".to_string(),
            pattern: Some(pattern.to_string()),
            score: 0.9,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_patterns_parse_and_validate() {
        let patterns = load_default_patterns().unwrap();
        assert!(patterns.iter().any(|p| p.name == "email_address"));
        assert!(patterns.iter().any(|p| p.validator == Some(Validator::Luhn)));
        validate_patterns(&patterns).unwrap();
    }

    #[test]
    fn test_merge_replaces_by_name_and_drops_disabled() {
        let defaults = vec![rule("a", "a+"), rule("b", "b+")];
        let user = vec![
            PatternRule { enabled: Some(false), ..rule("a", "a+") },
            rule("b", "bb+"),
            rule("c", "c+"),
        ];
        let merged = merge_patterns(defaults, user);
        let names: Vec<&str> = merged.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c"]);
        assert_eq!(merged[0].pattern.as_deref(), Some("bb+"));
    }

    #[test]
    fn test_validate_patterns_reports_all_problems() {
        let rules = vec![
            rule("dup", "x"),
            rule("dup", "y"),
            PatternRule { pattern: None, ..rule("missing", "") },
            rule("broken", "(unclosed"),
            PatternRule { score: 1.5, ..rule("score", "z") },
            PatternRule { entity_type: "bad tag".into(), ..rule("tag", "z") },
        ];
        let message = validate_patterns(&rules).unwrap_err().to_string();
        assert!(message.contains("Duplicate pattern rule name found: 'dup'"));
        assert!(message.contains("'missing' is missing the `pattern` field"));
        assert!(message.contains("'broken' has an invalid regex pattern"));
        assert!(message.contains("Rule 'score': score must be within [0, 1]"));
        assert!(message.contains("Rule 'tag'"));
    }

    #[test]
    fn test_pattern_length_limit() {
        let long = "a".repeat(MAX_PATTERN_LENGTH + 1);
        let message = validate_patterns(&[rule("long", &long)]).unwrap_err().to_string();
        assert!(message.contains("exceeds maximum allowed"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_ENTITIES, "person, email_address"),
            (ENV_HASH_SALT, "pepper"),
            (ENV_DETECTION_TIMEOUT_MS, "1500"),
            (ENV_SCORE_THRESHOLD, "0.5"),
            (ENV_ANALYZER_URL, "http://localhost:5002"),
        ]);
        let mut config = RedactorConfig::default();
        config
            .apply_env_overrides_from(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.entities, vec!["person", "email_address"]);
        let entities = config.default_entities().unwrap();
        assert_eq!(entities.len(), 2);
        assert!(entities.contains_tag("PERSON"));
        assert_eq!(config.hash_salt.as_deref(), Some("pepper"));
        assert_eq!(config.detection_timeout_ms, Some(1500));
        assert_eq!(config.score_threshold, 0.5);
        assert_eq!(config.analyzer.endpoint.as_deref(), Some("http://localhost:5002"));
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let mut config = RedactorConfig::default();
        let result = config.apply_env_overrides_from(|key| (key == ENV_SCORE_THRESHOLD).then(|| "high".to_string()));
        assert!(matches!(result, Err(RedactorError::Config(_))));

        let mut config = RedactorConfig::default();
        let result = config.apply_env_overrides_from(|key| (key == ENV_SCORE_THRESHOLD).then(|| "2.0".to_string()));
        assert!(matches!(result, Err(RedactorError::Config(_))));
    }

    #[test]
    fn test_empty_entities_mean_legal_default() {
        let config = RedactorConfig::default();
        assert_eq!(config.default_entities().unwrap(), EntitySet::legal_default());
    }

    #[test]
    fn test_yaml_policy_section_parses() {
        let yaml = r#"
entities: [PERSON, US_SSN]
score_threshold: 0.5
policy:
  default:
    kind: literal
    value: "[X]"
  entities:
    US_SSN:
      kind: mask
      keep_last: 4
"#;
        let config: RedactorConfig = serde_yml::from_str(yaml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.policy.entities.len(), 1);
        assert!(config.builtin_recognizers, "unspecified fields keep their defaults");
        assert_eq!(config.language, "en");
    }
}
