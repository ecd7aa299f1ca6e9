// jurisguard-core/src/entity.rs
//! Entity type tags and allowlists.
//!
//! Entity types form an open set of upper-case string tags. The tags known to the
//! bundled recognizers and the default policy are listed in [`tags`], but any
//! well-formed tag is accepted: adding a new entity type is a data change
//! (a recognizer pattern plus a policy entry), not a code change.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::errors::RedactorError;

/// Maximum length of an entity type tag.
pub const MAX_TAG_LENGTH: usize = 64;

/// Tags produced by the bundled recognizers.
pub mod tags {
    pub const PERSON: &str = "PERSON";
    pub const PHONE_NUMBER: &str = "PHONE_NUMBER";
    pub const EMAIL_ADDRESS: &str = "EMAIL_ADDRESS";
    pub const US_SSN: &str = "US_SSN";
    pub const IBAN_CODE: &str = "IBAN_CODE";
    pub const CREDIT_CARD: &str = "CREDIT_CARD";
    pub const US_DRIVER_LICENSE: &str = "US_DRIVER_LICENSE";
    pub const US_PASSPORT: &str = "US_PASSPORT";
    pub const IP_ADDRESS: &str = "IP_ADDRESS";
    pub const DATE_TIME: &str = "DATE_TIME";
    pub const LOCATION: &str = "LOCATION";
}

/// The entity allowlist used for legal documents when a request does not name one.
pub const LEGAL_PII_ENTITIES: [&str; 11] = [
    tags::PERSON,
    tags::PHONE_NUMBER,
    tags::EMAIL_ADDRESS,
    tags::US_SSN,
    tags::IBAN_CODE,
    tags::CREDIT_CARD,
    tags::US_DRIVER_LICENSE,
    tags::US_PASSPORT,
    tags::IP_ADDRESS,
    tags::DATE_TIME,
    tags::LOCATION,
];

static TAG_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").unwrap());

/// A validated, normalized entity type tag such as `EMAIL_ADDRESS`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityType(String);

impl EntityType {
    /// Parses a tag, trimming whitespace and upper-casing it.
    pub fn new(tag: impl AsRef<str>) -> Result<Self, RedactorError> {
        let normalized = tag.as_ref().trim().to_ascii_uppercase();
        if normalized.is_empty() {
            return Err(RedactorError::InvalidInput("entity type must not be empty".to_string()));
        }
        if normalized.len() > MAX_TAG_LENGTH {
            return Err(RedactorError::InvalidInput(format!(
                "entity type exceeds {} characters",
                MAX_TAG_LENGTH
            )));
        }
        if !TAG_SHAPE.is_match(&normalized) {
            return Err(RedactorError::InvalidInput(format!(
                "malformed entity type '{}': expected letters, digits and underscores",
                normalized
            )));
        }
        Ok(Self(normalized))
    }

    /// Wraps one of the bundled [`tags`] without re-validating it.
    pub(crate) fn known(tag: &'static str) -> Self {
        debug_assert!(TAG_SHAPE.is_match(tag));
        Self(tag.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EntityType {
    type Error = RedactorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        EntityType::new(value)
    }
}

impl From<EntityType> for String {
    fn from(value: EntityType) -> Self {
        value.0
    }
}

impl PartialEq<str> for EntityType {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for EntityType {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// An ordered set of entity types; the allowlist driving one detection call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntitySet(BTreeSet<EntityType>);

impl EntitySet {
    /// The legal-domain allowlist.
    pub fn legal_default() -> Self {
        Self(
            LEGAL_PII_ENTITIES
                .iter()
                .map(|tag| EntityType::known(*tag))
                .collect(),
        )
    }

    /// Parses a list of tags. Any malformed entry fails the whole list.
    pub fn parse<I, S>(items: I) -> Result<Self, RedactorError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for item in items {
            set.insert(EntityType::new(item)?);
        }
        Ok(Self(set))
    }

    /// Parses an optional request allowlist. `None` or an empty list falls back
    /// to `default`.
    pub fn resolve_request<S: AsRef<str>>(requested: Option<&[S]>, default: &EntitySet) -> Result<Self, RedactorError> {
        match requested {
            Some(items) if !items.is_empty() => Self::parse(items),
            _ => Ok(default.clone()),
        }
    }

    pub fn contains(&self, entity: &EntityType) -> bool {
        self.0.contains(entity)
    }

    pub fn contains_tag(&self, tag: &str) -> bool {
        self.0.iter().any(|e| e.as_str() == tag)
    }

    pub fn insert(&mut self, entity: EntityType) -> bool {
        self.0.insert(entity)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityType> {
        self.0.iter()
    }

    /// Returns the entity types present in both sets.
    pub fn intersection(&self, other: &EntitySet) -> EntitySet {
        Self(self.0.intersection(&other.0).cloned().collect())
    }

    pub fn to_vec(&self) -> Vec<EntityType> {
        self.0.iter().cloned().collect()
    }
}

impl FromIterator<EntityType> for EntitySet {
    fn from_iter<T: IntoIterator<Item = EntityType>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_normalizes_case_and_whitespace() {
        let entity = EntityType::new("  email_address ").unwrap();
        assert_eq!(entity.as_str(), "EMAIL_ADDRESS");
        assert_eq!(entity, tags::EMAIL_ADDRESS);
    }

    #[test]
    fn test_entity_type_rejects_malformed_tags() {
        for bad in ["", "   ", "EMAIL-ADDRESS", "1PERSON", "PER SON", "<PARTY>"] {
            assert!(
                matches!(EntityType::new(bad), Err(RedactorError::InvalidInput(_))),
                "expected '{}' to be rejected",
                bad
            );
        }
        assert!(EntityType::new("A".repeat(MAX_TAG_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_legal_default_has_all_entities() {
        let set = EntitySet::legal_default();
        assert_eq!(set.len(), LEGAL_PII_ENTITIES.len());
        assert!(set.contains_tag(tags::PERSON));
        assert!(set.contains_tag(tags::LOCATION));
    }

    #[test]
    fn test_resolve_request_falls_back_on_none_and_empty() {
        let default = EntitySet::legal_default();
        let none: Option<&[&str]> = None;
        assert_eq!(EntitySet::resolve_request(none, &default).unwrap(), default);
        let empty: [&str; 0] = [];
        assert_eq!(EntitySet::resolve_request(Some(&empty[..]), &default).unwrap(), default);

        let only_email = EntitySet::resolve_request(Some(&["email_address"][..]), &default).unwrap();
        assert_eq!(only_email.len(), 1);
        assert!(only_email.contains_tag(tags::EMAIL_ADDRESS));
    }

    #[test]
    fn test_resolve_request_rejects_bad_entry() {
        let default = EntitySet::legal_default();
        let result = EntitySet::resolve_request(Some(&["PERSON", "not valid!"][..]), &default);
        assert!(matches!(result, Err(RedactorError::InvalidInput(_))));
    }

    #[test]
    fn test_entity_type_deserializes_with_validation() {
        let ok: EntityType = serde_json::from_str("\"person\"").unwrap();
        assert_eq!(ok.as_str(), "PERSON");
        assert!(serde_json::from_str::<EntityType>("\"bad tag\"").is_err());
    }
}
