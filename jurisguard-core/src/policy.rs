// jurisguard-core/src/policy.rs
//! Replacement rules and the policy store.
//!
//! The policy store maps entity types to [`ReplacementRule`]s and falls back to a
//! DEFAULT rule, so lookup never fails and new entity types need no code change.
//! The embedded `config/default_policy.yaml` provides the placeholders used for
//! legal documents; configuration files can override any entry.
//!
//! `hash` rules produce a keyed, per-value token (HMAC-SHA256 over
//! `ENTITY:value`), which lets a reader tell that two placeholders refer to the
//! same value without revealing it. The key comes from configuration or is a
//! random per-process salt.
//!
//! License: MIT OR APACHE 2.0

use hmac::{Hmac, Mac};
use log::debug;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::BTreeMap;
use std::fmt;
use tinytemplate::TinyTemplate;
use uuid::Uuid;

use crate::config::PolicyConfig;
use crate::entity::EntityType;
use crate::errors::RedactorError;

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_HASH_TEMPLATE: &str = "<{entity}_{shorthash}>";
pub const MIN_HASH_LENGTH: usize = 4;
pub const MAX_HASH_LENGTH: usize = 64;
const MAX_FIXED_MASK_LENGTH: usize = 256;

/// Salt used by `hash` rules when no salt is configured. Stable for the life of
/// the process, so equal values map to equal tokens across documents.
static PROCESS_SALT: Lazy<String> = Lazy::new(|| Uuid::new_v4().to_string());

fn default_mask_char() -> char {
    '*'
}

fn default_hash_template() -> String {
    DEFAULT_HASH_TEMPLATE.to_string()
}

fn default_hash_length() -> usize {
    8
}

/// How a detected span is rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplacementRule {
    /// Replace the span with fixed text.
    Literal { value: String },
    /// Replace alphanumerics with `mask_char`, keeping the last `keep_last`
    /// alphanumerics and every separator. With `fixed_length` the output is
    /// that many mask characters followed by the kept tail.
    Mask {
        #[serde(default = "default_mask_char")]
        mask_char: char,
        #[serde(default)]
        keep_last: usize,
        #[serde(default)]
        fixed_length: Option<usize>,
    },
    /// Replace the span with a keyed short hash rendered through `template`
    /// (variables `entity` and `shorthash`).
    Hash {
        #[serde(default = "default_hash_template")]
        template: String,
        #[serde(default = "default_hash_length")]
        length: usize,
    },
}

impl ReplacementRule {
    pub fn literal(value: impl Into<String>) -> Self {
        ReplacementRule::Literal { value: value.into() }
    }

    /// Checks rule parameters, including that a hash template renders.
    pub fn validate(&self) -> Result<(), RedactorError> {
        match self {
            ReplacementRule::Literal { .. } => Ok(()),
            ReplacementRule::Mask { mask_char, fixed_length, .. } => {
                if mask_char.is_control() || mask_char.is_alphanumeric() {
                    return Err(RedactorError::Config(format!(
                        "mask_char {:?} must be a visible non-alphanumeric character",
                        mask_char
                    )));
                }
                if fixed_length.map_or(false, |n| n > MAX_FIXED_MASK_LENGTH) {
                    return Err(RedactorError::Config(format!(
                        "mask fixed_length must not exceed {}",
                        MAX_FIXED_MASK_LENGTH
                    )));
                }
                Ok(())
            }
            ReplacementRule::Hash { template, length } => {
                if !(MIN_HASH_LENGTH..=MAX_HASH_LENGTH).contains(length) {
                    return Err(RedactorError::Config(format!(
                        "hash length must be within {}..={}, got {}",
                        MIN_HASH_LENGTH, MAX_HASH_LENGTH, length
                    )));
                }
                render_hash_template(template, "ENTITY", &"0".repeat(*length))
                    .map(|_| ())
                    .map_err(|e| RedactorError::Config(format!("hash template: {}", e)))
            }
        }
    }

    /// Produces the replacement for `value` detected as `entity`.
    pub fn apply(&self, entity: &EntityType, value: &str, salt: &[u8]) -> Result<String, RedactorError> {
        match self {
            ReplacementRule::Literal { value } => Ok(value.clone()),
            ReplacementRule::Mask { mask_char, keep_last, fixed_length } => {
                Ok(mask_value(value, *mask_char, *keep_last, *fixed_length))
            }
            ReplacementRule::Hash { template, length } => {
                let digest = keyed_digest_hex(salt, entity, value)?;
                let length = (*length).clamp(MIN_HASH_LENGTH, MAX_HASH_LENGTH);
                render_hash_template(template, entity.as_str(), &digest[..length])
                    .map_err(|e| RedactorError::RedactionFailed(format!("hash template for {}: {}", entity, e)))
            }
        }
    }
}

/// Masks alphanumerics, keeping the last `keep_last` of them visible.
pub fn mask_value(value: &str, mask_char: char, keep_last: usize, fixed_length: Option<usize>) -> String {
    let alnum_total = value.chars().filter(|c| c.is_alphanumeric()).count();
    let keep_from = alnum_total.saturating_sub(keep_last);

    match fixed_length {
        Some(n) => {
            let tail: String = value
                .chars()
                .filter(|c| c.is_alphanumeric())
                .skip(keep_from)
                .collect();
            let mut out: String = std::iter::repeat(mask_char).take(n).collect();
            out.push_str(&tail);
            out
        }
        None => {
            let mut seen = 0;
            value
                .chars()
                .map(|c| {
                    if !c.is_alphanumeric() {
                        return c;
                    }
                    seen += 1;
                    if seen > keep_from {
                        c
                    } else {
                        mask_char
                    }
                })
                .collect()
        }
    }
}

fn keyed_digest_hex(salt: &[u8], entity: &EntityType, value: &str) -> Result<String, RedactorError> {
    let mut mac = HmacSha256::new_from_slice(salt)
        .map_err(|e| RedactorError::RedactionFailed(format!("failed to initialize HMAC-SHA256: {}", e)))?;
    mac.update(entity.as_str().as_bytes());
    mac.update(b":");
    mac.update(value.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[derive(Serialize)]
struct TokenContext<'a> {
    entity: &'a str,
    shorthash: &'a str,
}

fn render_hash_template(template: &str, entity: &str, shorthash: &str) -> Result<String, tinytemplate::error::Error> {
    let mut tt = TinyTemplate::new();
    tt.set_default_formatter(&tinytemplate::format_unescaped);
    tt.add_template("token", template)?;
    tt.render("token", &TokenContext { entity, shorthash })
}

/// Entity type to replacement rule registry with a DEFAULT fallback.
#[derive(Clone)]
pub struct PolicyStore {
    default: ReplacementRule,
    rules: BTreeMap<EntityType, ReplacementRule>,
    salt: Vec<u8>,
}

impl fmt::Debug for PolicyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyStore")
            .field("default", &self.default)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl PolicyStore {
    /// A store with only a DEFAULT rule.
    pub fn new(default: ReplacementRule) -> Self {
        Self {
            default,
            rules: BTreeMap::new(),
            salt: PROCESS_SALT.as_bytes().to_vec(),
        }
    }

    /// The embedded legal-document policy.
    pub fn builtin() -> Result<Self, RedactorError> {
        let config = load_default_policy()?;
        let mut store = Self::new(ReplacementRule::literal("<REDACTED>"));
        store.apply_config(&config)?;
        Ok(store)
    }

    /// The embedded policy with `overrides` merged over it.
    pub fn from_config(overrides: &PolicyConfig, salt: Option<&str>) -> Result<Self, RedactorError> {
        let mut store = Self::builtin()?;
        store.apply_config(overrides)?;
        if let Some(salt) = salt {
            store = store.with_salt(salt);
        }
        Ok(store)
    }

    fn apply_config(&mut self, config: &PolicyConfig) -> Result<(), RedactorError> {
        if let Some(rule) = &config.default {
            rule.validate()?;
            self.default = rule.clone();
        }
        for (tag, rule) in &config.entities {
            let entity = EntityType::new(tag).map_err(|e| RedactorError::Config(format!("policy entry: {}", e)))?;
            rule.validate()?;
            self.rules.insert(entity, rule.clone());
        }
        debug!("Policy store holds {} entity rule(s) plus DEFAULT.", self.rules.len());
        Ok(())
    }

    pub fn with_salt(mut self, salt: impl AsRef<[u8]>) -> Self {
        self.salt = salt.as_ref().to_vec();
        self
    }

    pub fn set_rule(&mut self, entity: EntityType, rule: ReplacementRule) {
        self.rules.insert(entity, rule);
    }

    pub fn set_default(&mut self, rule: ReplacementRule) {
        self.default = rule;
    }

    /// Exact entity-type match, else DEFAULT.
    pub fn rule_for(&self, entity: &EntityType) -> &ReplacementRule {
        self.rules.get(entity).unwrap_or(&self.default)
    }

    pub fn default_rule(&self) -> &ReplacementRule {
        &self.default
    }

    /// Renders the replacement for one detected value.
    pub fn render(&self, entity: &EntityType, value: &str) -> Result<String, RedactorError> {
        self.rule_for(entity).apply(entity, value, &self.salt)
    }
}

/// Parses the embedded default policy.
pub fn load_default_policy() -> Result<PolicyConfig, RedactorError> {
    let default_yaml = include_str!("../config/default_policy.yaml");
    serde_yml::from_str(default_yaml)
        .map_err(|e| RedactorError::Config(format!("Failed to parse default policy: {}", e)))
}
