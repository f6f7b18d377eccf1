//! # Wordsense Resolver
//!
//! Binds each relation's target word to one canonical sense of that word.
//!
//! Resolution is filter-then-rank:
//!
//! 1. candidates = senses of the exact target word
//! 2. none → unmatched; one → unique match
//! 3. several → BM25 over `"{target}. {gloss}"`, highest score wins, ties go to the lowest id
//!
//! A ranked match is flagged ambiguous when the runner-up scores within
//! `ambiguity_tolerance` of the winner. Every relation yields exactly one resolution.

mod error;
mod resolver;

pub use error::{ResolverError, Result};
pub use resolver::{
    relation_query, RankedCandidate, RelationResolver, Resolution, ResolutionOutcome,
    ResolveStats, ResolverConfig,
};
