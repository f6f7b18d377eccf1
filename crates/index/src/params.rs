use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};

/// BM25 term-saturation (`k1`) and length-normalization (`b`) parameters
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    pub k1: f32,
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

impl Bm25Params {
    pub fn validate(&self) -> Result<()> {
        if !self.k1.is_finite() || self.k1 < 0.0 {
            return Err(IndexError::InvalidParams(format!(
                "k1 must be a non-negative number, got {}",
                self.k1
            )));
        }
        if !(0.0..=1.0).contains(&self.b) {
            return Err(IndexError::InvalidParams(format!(
                "b must be within [0, 1], got {}",
                self.b
            )));
        }
        Ok(())
    }

    /// Saturated, length-normalized weight of `tf` occurrences in a doc of length `doc_len`
    pub(crate) fn term_weight(&self, tf: f32, doc_len: f32, avg_doc_len: f32) -> f32 {
        if tf <= 0.0 {
            return 0.0;
        }
        let norm = 1.0 - self.b + self.b * doc_len / avg_doc_len.max(1e-3);
        let denom = tf + self.k1 * norm;
        if denom > 0.0 {
            tf * (self.k1 + 1.0) / denom
        } else {
            0.0
        }
    }
}

/// Okapi idf with the `+ 1` inside the log, so it stays positive for every `df <= total_docs`
pub(crate) fn bm25_idf(total_docs: f32, df: f32) -> f32 {
    ((total_docs - df + 0.5) / (df + 0.5) + 1.0).ln()
}
