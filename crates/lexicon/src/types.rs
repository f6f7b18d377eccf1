use crate::error::{LexiconError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a canonical sense, contiguous from 0 in first-seen order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SenseId(pub u32);

impl SenseId {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Position of this sense in the ordered sense table
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a resolved relation, assigned by the single relation writer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationId(pub u32);

impl RelationId {
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One sense of a word as delivered by the loader
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenseRaw {
    #[serde(default)]
    pub glosses: Vec<String>,

    #[serde(default)]
    pub raw_glosses: Vec<String>,
}

impl SenseRaw {
    #[must_use]
    pub fn new(glosses: Vec<String>, raw_glosses: Vec<String>) -> Self {
        Self {
            glosses,
            raw_glosses,
        }
    }

    /// Definition text of this sense.
    ///
    /// `raw_glosses` wins when it carries any text, `glosses` is the fallback. Multiple glosses
    /// are joined with a single space. Returns `None` when neither list carries text.
    #[must_use]
    pub fn definition(&self) -> Option<String> {
        join_glosses(&self.raw_glosses).or_else(|| join_glosses(&self.glosses))
    }
}

fn join_glosses(glosses: &[String]) -> Option<String> {
    let parts: Vec<&str> = glosses
        .iter()
        .map(|g| g.trim())
        .filter(|g| !g.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

/// A word's aggregate entry: surface forms plus ordered senses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawLexeme")]
pub struct Lexeme {
    word: String,
    forms: Vec<String>,
    senses: Vec<SenseRaw>,
}

impl Lexeme {
    /// Build a lexeme, rejecting blank words
    pub fn new(word: impl Into<String>, forms: Vec<String>, senses: Vec<SenseRaw>) -> Result<Self> {
        let word = word.into();
        if word.trim().is_empty() {
            return Err(LexiconError::empty("word"));
        }
        Ok(Self {
            word,
            forms,
            senses,
        })
    }

    #[must_use]
    pub fn word(&self) -> &str {
        &self.word
    }

    #[must_use]
    pub fn forms(&self) -> &[String] {
        &self.forms
    }

    #[must_use]
    pub fn senses(&self) -> &[SenseRaw] {
        &self.senses
    }
}

/// A form entry is either a bare string or a wiktextract `{ "form": ... }` object
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum FormValue {
    Plain(String),
    Tagged { form: String },
}

impl FormValue {
    pub(crate) fn into_form(self) -> String {
        match self {
            Self::Plain(form) | Self::Tagged { form } => form,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawLexeme {
    word: String,
    #[serde(default)]
    forms: Vec<FormValue>,
    #[serde(default)]
    senses: Vec<SenseRaw>,
}

impl TryFrom<RawLexeme> for Lexeme {
    type Error = LexiconError;

    fn try_from(raw: RawLexeme) -> Result<Self> {
        let forms = raw.forms.into_iter().map(FormValue::into_form).collect();
        Self::new(raw.word, forms, raw.senses)
    }
}

/// Kind of semantic link between two words
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RelationType {
    Synonym,
    Antonym,
    Hypernym,
    Holonym,
    Meronym,
    CoordinateTerm,
    Derived,
    Related,
    Other(String),
}

impl RelationType {
    /// Parse a relation name, accepting plural and dashed spellings (`synonyms`,
    /// `coordinate-terms`)
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase().replace(['-', ' '], "_");
        let singular = normalized.strip_suffix('s').unwrap_or(&normalized);
        match singular {
            "synonym" => Self::Synonym,
            "antonym" => Self::Antonym,
            "hypernym" => Self::Hypernym,
            "holonym" => Self::Holonym,
            "meronym" => Self::Meronym,
            "coordinate_term" => Self::CoordinateTerm,
            "derived" => Self::Derived,
            "related" => Self::Related,
            _ => Self::Other(normalized),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Synonym => "synonym",
            Self::Antonym => "antonym",
            Self::Hypernym => "hypernym",
            Self::Holonym => "holonym",
            Self::Meronym => "meronym",
            Self::CoordinateTerm => "coordinate_term",
            Self::Derived => "derived",
            Self::Related => "related",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for RelationType {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<RelationType> for String {
    fn from(kind: RelationType) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A relation as extracted from the corpus: target word plus a free-text gloss hint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRelation")]
pub struct RelationRaw {
    source_word: String,
    relation_type: RelationType,
    target_word: String,
    gloss_fragment: String,
}

impl RelationRaw {
    /// Build a relation, rejecting blank source or target words
    pub fn new(
        source_word: impl Into<String>,
        relation_type: RelationType,
        target_word: impl Into<String>,
        gloss_fragment: impl Into<String>,
    ) -> Result<Self> {
        let source_word = source_word.into();
        let target_word = target_word.into();
        if source_word.trim().is_empty() {
            return Err(LexiconError::empty("source_word"));
        }
        if target_word.trim().is_empty() {
            return Err(LexiconError::empty("target_word"));
        }
        Ok(Self {
            source_word,
            relation_type,
            target_word,
            gloss_fragment: gloss_fragment.into(),
        })
    }

    #[must_use]
    pub fn source_word(&self) -> &str {
        &self.source_word
    }

    #[must_use]
    pub const fn relation_type(&self) -> &RelationType {
        &self.relation_type
    }

    #[must_use]
    pub fn target_word(&self) -> &str {
        &self.target_word
    }

    #[must_use]
    pub fn gloss_fragment(&self) -> &str {
        &self.gloss_fragment
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawRelation {
    #[serde(alias = "sourceWord")]
    source_word: String,
    #[serde(alias = "relationType")]
    relation_type: String,
    #[serde(alias = "targetWord")]
    target_word: String,
    #[serde(default, alias = "glossFragment", alias = "sense")]
    gloss_fragment: Option<String>,
}

impl TryFrom<RawRelation> for RelationRaw {
    type Error = LexiconError;

    fn try_from(raw: RawRelation) -> Result<Self> {
        Self::new(
            raw.source_word,
            RelationType::parse(&raw.relation_type),
            raw.target_word,
            raw.gloss_fragment.unwrap_or_default(),
        )
    }
}

/// A deduplicated `(word, definition)` pair with its stable id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalSense {
    pub id: SenseId,
    pub word: String,
    pub definition: String,
    pub text: String,
}

impl CanonicalSense {
    #[must_use]
    pub fn new(id: SenseId, word: impl Into<String>, definition: impl Into<String>) -> Self {
        let word = word.into();
        let definition = definition.into();
        let text = sense_text(&word, &definition);
        Self {
            id,
            word,
            definition,
            text,
        }
    }
}

/// Retrieval text of a sense: `word + ". " + definition`, trimmed
#[must_use]
pub fn sense_text(word: &str, definition: &str) -> String {
    format!("{word}. {definition}").trim().to_string()
}

/// Outcome of resolving one relation against the sense store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRelation {
    pub id: RelationId,
    pub source_word: String,
    pub relation_type: RelationType,
    pub target_word: String,
    pub gloss_fragment: String,
    pub matched_sense_id: Option<SenseId>,
    pub score: f32,
    pub ambiguous: bool,
}
