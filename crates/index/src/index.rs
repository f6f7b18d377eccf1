use crate::error::{IndexError, Result};
use crate::params::{bm25_idf, Bm25Params};
use crate::tokenize::tokenize;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;
use wordsense_lexicon::{CanonicalSense, SenseId};

/// One entry of a postings list
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Posting {
    pub sense: SenseId,
    pub tf: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct IndexStats {
    pub docs: usize,
    pub terms: usize,
    pub postings: usize,
    pub avg_doc_len: f32,
    pub time_ms: u64,
}

/// Query terms resolved against an index, with their idf precomputed.
///
/// Terms unknown to the index are dropped: they cannot contribute to any score.
#[derive(Clone, Debug, Default)]
pub struct PreparedQuery {
    terms: Vec<QueryTerm>,
}

#[derive(Clone, Copy, Debug)]
struct QueryTerm {
    slot: u32,
    count: u32,
    idf: f32,
}

impl PreparedQuery {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }
}

/// Immutable BM25 inverted index over canonical sense text.
///
/// Postings lists are sorted by sense id, so the term frequency of a (term, sense) pair is a
/// binary search. Nothing is ever inserted after [`SenseIndex::build`] returns, which makes
/// the index safe to share across resolver threads without locks.
#[derive(Debug)]
pub struct SenseIndex {
    params: Bm25Params,
    terms: HashMap<String, u32>,
    postings: Vec<Vec<Posting>>,
    doc_lens: Vec<u32>,
    avg_doc_len: f32,
    build_ms: u64,
}

#[derive(Default)]
struct PartialIndex {
    terms: HashMap<String, Vec<Posting>>,
    doc_lens: Vec<u32>,
}

impl PartialIndex {
    fn from_docs(docs: &[CanonicalSense]) -> Result<Self> {
        let mut partial = Self {
            terms: HashMap::new(),
            doc_lens: Vec::with_capacity(docs.len()),
        };
        let mut counts: HashMap<String, u32> = HashMap::new();
        for doc in docs {
            let tokens = tokenize(&doc.text);
            let len =
                u32::try_from(tokens.len()).map_err(|_| IndexError::CapacityExceeded("tokens"))?;
            partial.doc_lens.push(len);

            counts.clear();
            for token in tokens {
                *counts.entry(token).or_insert(0) += 1;
            }
            for (term, tf) in counts.drain() {
                partial.terms.entry(term).or_default().push(Posting {
                    sense: doc.id,
                    tf,
                });
            }
        }
        Ok(partial)
    }
}

impl SenseIndex {
    /// Build the index on the calling thread
    pub fn build(senses: &[CanonicalSense], params: Bm25Params) -> Result<Self> {
        let start = Instant::now();
        params.validate()?;
        check_contiguous(senses)?;
        let partial = PartialIndex::from_docs(senses)?;
        Self::assemble(params, std::iter::once(partial), senses.len(), start)
    }

    /// Build the index with one postings shard per `shard_size` documents on the current rayon
    /// pool; shards are merged in document order.
    pub fn build_parallel(
        senses: &[CanonicalSense],
        params: Bm25Params,
        shard_size: usize,
    ) -> Result<Self> {
        let start = Instant::now();
        params.validate()?;
        check_contiguous(senses)?;
        let shard_size = shard_size.max(1);
        let partials = senses
            .par_chunks(shard_size)
            .map(PartialIndex::from_docs)
            .collect::<Result<Vec<_>>>()?;
        log::debug!(
            "Built {} postings shards of up to {shard_size} docs",
            partials.len()
        );
        Self::assemble(params, partials, senses.len(), start)
    }

    fn assemble(
        params: Bm25Params,
        partials: impl IntoIterator<Item = PartialIndex>,
        doc_count: usize,
        start: Instant,
    ) -> Result<Self> {
        let mut terms: HashMap<String, u32> = HashMap::new();
        let mut postings: Vec<Vec<Posting>> = Vec::new();
        let mut doc_lens = Vec::with_capacity(doc_count);

        for partial in partials {
            doc_lens.extend(partial.doc_lens);
            for (term, list) in partial.terms {
                if let Some(&slot) = terms.get(&term) {
                    postings[slot as usize].extend(list);
                } else {
                    let slot = u32::try_from(postings.len())
                        .map_err(|_| IndexError::CapacityExceeded("terms"))?;
                    terms.insert(term, slot);
                    postings.push(list);
                }
            }
        }

        let total_len: u64 = doc_lens.iter().map(|&len| u64::from(len)).sum();
        let avg_doc_len = if doc_lens.is_empty() {
            0.0
        } else {
            (total_len as f64 / doc_lens.len() as f64) as f32
        };

        let index = Self {
            params,
            terms,
            postings,
            doc_lens,
            avg_doc_len,
            build_ms: start.elapsed().as_millis() as u64,
        };
        let stats = index.stats();
        log::info!(
            "Sense index built: {} docs, {} terms, {} postings, avg len {:.2} ({} ms)",
            stats.docs,
            stats.terms,
            stats.postings,
            stats.avg_doc_len,
            stats.time_ms
        );
        Ok(index)
    }

    /// Tokenize `text` and resolve its terms against the index
    #[must_use]
    pub fn prepare(&self, text: &str) -> PreparedQuery {
        let total_docs = self.doc_lens.len() as f32;
        let mut terms: Vec<QueryTerm> = Vec::new();
        for token in tokenize(text) {
            let Some(&slot) = self.terms.get(&token) else {
                continue;
            };
            if let Some(existing) = terms.iter_mut().find(|t| t.slot == slot) {
                existing.count += 1;
                continue;
            }
            let df = self.postings[slot as usize].len() as f32;
            terms.push(QueryTerm {
                slot,
                count: 1,
                idf: bm25_idf(total_docs, df),
            });
        }
        PreparedQuery { terms }
    }

    /// BM25 score of `sense` for `query`; 0 when they share no term or the id is unknown
    #[must_use]
    pub fn score(&self, query: &PreparedQuery, sense: SenseId) -> f32 {
        let Some(&doc_len) = self.doc_lens.get(sense.index()) else {
            return 0.0;
        };
        let doc_len = doc_len as f32;
        query
            .terms
            .iter()
            .map(|term| {
                let tf = self.term_frequency(term.slot, sense) as f32;
                term.count as f32
                    * term.idf
                    * self.params.term_weight(tf, doc_len, self.avg_doc_len)
            })
            .sum()
    }

    /// Convenience wrapper around [`SenseIndex::prepare`] + [`SenseIndex::score`]
    #[must_use]
    pub fn score_text(&self, query: &str, sense: SenseId) -> f32 {
        self.score(&self.prepare(query), sense)
    }

    fn term_frequency(&self, slot: u32, sense: SenseId) -> u32 {
        let list = &self.postings[slot as usize];
        list.binary_search_by_key(&sense, |p| p.sense)
            .map_or(0, |pos| list[pos].tf)
    }

    /// Postings of `term` (already lowercase), sorted by sense id
    #[must_use]
    pub fn postings(&self, term: &str) -> &[Posting] {
        self.terms
            .get(term)
            .map_or(&[], |&slot| self.postings[slot as usize].as_slice())
    }

    #[must_use]
    pub const fn params(&self) -> Bm25Params {
        self.params
    }

    #[must_use]
    pub fn doc_count(&self) -> usize {
        self.doc_lens.len()
    }

    #[must_use]
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    #[must_use]
    pub const fn avg_doc_len(&self) -> f32 {
        self.avg_doc_len
    }

    #[must_use]
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            docs: self.doc_count(),
            terms: self.term_count(),
            postings: self.postings.iter().map(Vec::len).sum(),
            avg_doc_len: self.avg_doc_len,
            time_ms: self.build_ms,
        }
    }
}

fn check_contiguous(senses: &[CanonicalSense]) -> Result<()> {
    if u32::try_from(senses.len()).is_err() {
        return Err(IndexError::CapacityExceeded("documents"));
    }
    for (position, sense) in senses.iter().enumerate() {
        if sense.id.index() != position {
            return Err(IndexError::NonContiguous {
                position,
                id: sense.id.get(),
            });
        }
    }
    Ok(())
}
