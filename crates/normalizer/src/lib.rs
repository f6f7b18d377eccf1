//! # Wordsense Normalizer
//!
//! Turns a stream of [`Lexeme`](wordsense_lexicon::Lexeme)s into a deduplicated sense table
//! with dense, input-ordered ids.
//!
//! Every lexeme contributes one `(word, definition)` pair per glossed sense, or `(word, word)`
//! when it has no senses at all. A pair seen before keeps its first id. Surface forms are
//! merged per word into a [`FormsTable`].

mod error;
mod forms;
mod normalizer;

pub use error::{NormalizerError, Result};
pub use forms::FormsTable;
pub use normalizer::{
    extract_pairs, Extraction, NormalizeStats, NormalizedSenses, NormalizerConfig,
    SenseNormalizer,
};
