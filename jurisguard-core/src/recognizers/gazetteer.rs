// jurisguard-core/src/recognizers/gazetteer.rs
//! Dictionary-backed recognizers for PERSON and LOCATION.
//!
//! Names and places do not follow a fixed shape, so these recognizers lean on
//! word lists shipped in `data/`. They give the engine useful PERSON and
//! LOCATION coverage when no external NLP analyzer is configured; an analyzer
//! plugged in through [`NlpRecognizer`](super::nlp::NlpRecognizer) can add to
//! or outscore them.
//!
//! License: MIT OR APACHE 2.0

use log::debug;
use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;

use crate::entity::{tags, EntitySet, EntityType};
use crate::errors::RedactorError;
use crate::finding::Candidate;
use crate::recognizer::{AnalysisContext, Recognizer};
use crate::recognizers::pattern::DEADLINE_CHECK_INTERVAL;

const GIVEN_NAMES_DATA: &str = include_str!("../../data/given_names.txt");
const LOCATIONS_DATA: &str = include_str!("../../data/locations.txt");
const NAME_STOPWORDS_DATA: &str = include_str!("../../data/name_stopwords.txt");

/// A known given name followed by at least one more capitalized word.
pub const FULL_NAME_SCORE: f64 = 0.85;
/// A known given name on its own.
pub const GIVEN_NAME_SCORE: f64 = 0.6;
/// A capitalized name after a title such as "Mr." or "Dr.".
pub const HONORIFIC_NAME_SCORE: f64 = 0.85;
pub const LOCATION_SCORE: f64 = 0.65;

/// Tokens of a name run, the given name included.
const MAX_NAME_TOKENS: usize = 3;

lazy_static! {
    static ref NAME_TOKEN: Regex =
        Regex::new(r"\b(?:[A-Z]'[A-Z][a-z]+|[A-Z][a-z]+(?:[-'][A-Z][a-z]+)*)\b").unwrap();
    static ref HONORIFIC_NAME: Regex = Regex::new(
        r"\b(?:Mr|Mrs|Ms|Miss|Dr|Prof|Judge|Justice)\.?[ \t]+([A-Z][a-z]+(?:[-'][A-Z][a-z]+)*)(?:[ \t]+([A-Z][a-z]+(?:[-'][A-Z][a-z]+)*))?\b",
    )
    .unwrap();
}

fn data_lines(data: &'static str) -> impl Iterator<Item = &'static str> {
    data.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// Finds person names from a list of given names and title prefixes.
#[derive(Debug)]
pub struct PersonRecognizer {
    entity: EntityType,
    entities: EntitySet,
    given_names: HashSet<String>,
    stopwords: HashSet<&'static str>,
}

impl Default for PersonRecognizer {
    fn default() -> Self {
        Self::with_given_names(data_lines(GIVEN_NAMES_DATA))
    }
}

impl PersonRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_given_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let given_names: HashSet<String> = names.into_iter().map(Into::into).collect();
        debug!("Person recognizer loaded {} given names.", given_names.len());
        let entity = EntityType::known(tags::PERSON);
        Self {
            entities: [entity.clone()].into_iter().collect(),
            entity,
            given_names,
            stopwords: data_lines(NAME_STOPWORDS_DATA).collect(),
        }
    }

    /// Words such as "Agreement" or "Holdings" that never continue a name.
    fn ends_name(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }

    /// Emits a candidate for every given name in a run of capitalized words,
    /// extended by up to two following words of the run that can be surnames.
    fn collect_run(&self, run: &[regex::Match<'_>], out: &mut Vec<Candidate>) {
        let mut i = 0;
        while i < run.len() {
            if !self.given_names.contains(run[i].as_str()) {
                i += 1;
                continue;
            }
            let mut last = i;
            while last + 1 < (i + MAX_NAME_TOKENS).min(run.len()) && !self.ends_name(run[last + 1].as_str()) {
                last += 1;
            }
            let score = if last > i { FULL_NAME_SCORE } else { GIVEN_NAME_SCORE };
            out.push(Candidate::new(self.entity.clone(), run[i].start(), run[last].end(), score, self.name()));
            i = last + 1;
        }
    }
}

/// Words in one run may only be separated by spaces or tabs.
fn is_inline_gap(gap: &str) -> bool {
    !gap.is_empty() && gap.chars().all(|c| c == ' ' || c == '\t')
}

impl Recognizer for PersonRecognizer {
    fn name(&self) -> &str {
        "gazetteer:person"
    }

    fn supported_entities(&self) -> &EntitySet {
        &self.entities
    }

    fn analyze(&self, text: &str, entities: &EntitySet, ctx: &AnalysisContext) -> Result<Vec<Candidate>, RedactorError> {
        if !entities.contains_tag(tags::PERSON) {
            return Ok(Vec::new());
        }
        let mut candidates = Vec::new();

        let mut run: Vec<regex::Match<'_>> = Vec::new();
        for (i, token) in NAME_TOKEN.find_iter(text).enumerate() {
            if i % DEADLINE_CHECK_INTERVAL == 0 {
                ctx.deadline.check()?;
            }
            if let Some(previous) = run.last() {
                if !is_inline_gap(&text[previous.end()..token.start()]) {
                    self.collect_run(&run, &mut candidates);
                    run.clear();
                }
            }
            run.push(token);
        }
        self.collect_run(&run, &mut candidates);

        for caps in HONORIFIC_NAME.captures_iter(text) {
            let Some(first) = caps.get(1) else { continue };
            if self.ends_name(first.as_str()) {
                continue;
            }
            let end = match caps.get(2) {
                Some(second) if !self.ends_name(second.as_str()) => second.end(),
                _ => first.end(),
            };
            candidates.push(Candidate::new(self.entity.clone(), first.start(), end, HONORIFIC_NAME_SCORE, self.name()));
        }
        Ok(candidates)
    }
}

/// Finds well-known place names.
#[derive(Debug)]
pub struct LocationRecognizer {
    entity: EntityType,
    entities: EntitySet,
    regex: Regex,
}

impl LocationRecognizer {
    pub fn new() -> Result<Self, RedactorError> {
        Self::with_names(data_lines(LOCATIONS_DATA))
    }

    /// Builds one alternation over `names`, longest first so that
    /// "New York City" wins over "New York".
    pub fn with_names<I, S>(names: I) -> Result<Self, RedactorError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<String> = names
            .into_iter()
            .map(|n| n.as_ref().trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        names.dedup();
        if names.is_empty() {
            return Err(RedactorError::Config("location gazetteer is empty".to_string()));
        }

        let alternation = names
            .iter()
            .map(|name| {
                let starts_word = name.chars().next().map_or(false, char::is_alphanumeric);
                let ends_word = name.chars().next_back().map_or(false, char::is_alphanumeric);
                format!(
                    "{}{}{}",
                    if starts_word { r"\b" } else { "" },
                    regex::escape(name),
                    if ends_word { r"\b" } else { "" }
                )
            })
            .collect::<Vec<_>>()
            .join("|");

        let regex = RegexBuilder::new(&format!("(?:{})", alternation))
            .size_limit(10 * (1 << 20))
            .build()
            .map_err(|e| RedactorError::PatternCompilation("gazetteer:location".to_string(), e))?;
        debug!("Location recognizer loaded {} place names.", names.len());

        let entity = EntityType::known(tags::LOCATION);
        Ok(Self {
            entities: [entity.clone()].into_iter().collect(),
            entity,
            regex,
        })
    }
}

impl Recognizer for LocationRecognizer {
    fn name(&self) -> &str {
        "gazetteer:location"
    }

    fn supported_entities(&self) -> &EntitySet {
        &self.entities
    }

    fn analyze(&self, text: &str, entities: &EntitySet, ctx: &AnalysisContext) -> Result<Vec<Candidate>, RedactorError> {
        if !entities.contains_tag(tags::LOCATION) {
            return Ok(Vec::new());
        }
        let mut candidates = Vec::new();
        for (i, m) in self.regex.find_iter(text).enumerate() {
            if i % DEADLINE_CHECK_INTERVAL == 0 {
                ctx.deadline.check()?;
            }
            candidates.push(Candidate::new(self.entity.clone(), m.start(), m.end(), LOCATION_SCORE, self.name()));
        }
        Ok(candidates)
    }
}
