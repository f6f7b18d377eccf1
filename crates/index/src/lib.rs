//! # Wordsense Index
//!
//! Inverted index over canonical sense text with BM25 scoring.
//!
//! ```text
//! CanonicalSense.text ──tokenize──> terms
//!        │
//!        ├──> shard 0 ─┐
//!        ├──> shard 1 ─┼─ merge in doc order ──> term -> [(sense, tf)] (sorted by sense)
//!        └──> shard n ─┘
//! ```
//!
//! Scoring is Okapi BM25:
//!
//! ```text
//! idf(t)      = ln((N - df(t) + 0.5) / (df(t) + 0.5) + 1)
//! score(q, d) = Σ_{t ∈ q} qtf(t) · idf(t) · tf·(k1+1) / (tf + k1·(1 - b + b·|d|/avgdl))
//! ```
//!
//! Scores are non-negative and identical across sequential and parallel builds of the same
//! corpus.

mod error;
mod index;
mod params;
mod tokenize;

pub use error::{IndexError, Result};
pub use index::{IndexStats, Posting, PreparedQuery, SenseIndex};
pub use params::Bm25Params;
pub use tokenize::tokenize;
