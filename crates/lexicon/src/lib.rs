//! # Wordsense Lexicon
//!
//! Record types shared by every stage of the sense build, plus the JSONL readers that sit at
//! the boundary with the corpus extraction tooling.
//!
//! ```text
//! lexemes.jsonl ──> LexemeReader ──> Lexeme { word, forms, senses: [SenseRaw] }
//!                                        │
//!                                        └─> CanonicalSense { id, word, definition, text }
//!
//! relations.jsonl ─> RelationReader ─> RelationRaw { source, type, target, gloss }
//!                                        │
//!                                        └─> ResolvedRelation { .., matched_sense_id, score }
//! ```
//!
//! Records are validated on construction: a [`Lexeme`] or [`RelationRaw`] never carries a
//! blank word.

mod error;
mod jsonl;
mod linkage;
mod types;

pub use error::{LexiconError, Result};
pub use jsonl::{JsonlReader, LexemeReader, ReadStats, RelationReader};
pub use linkage::{relations_from_lexeme, Linkage, LinkageLists, LinkedEntry, LinkedSense};
pub use types::{
    sense_text, CanonicalSense, Lexeme, RelationId, RelationRaw, RelationType, ResolvedRelation,
    SenseId, SenseRaw,
};
