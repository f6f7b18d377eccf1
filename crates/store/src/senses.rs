use crate::error::{Result, StoreError};
use std::collections::HashMap;
use wordsense_lexicon::{CanonicalSense, SenseId};

/// Append-only table of canonical senses with a `word -> ids` secondary index.
///
/// Ids are positions in the table, so point lookup is a slice index. Uniqueness of
/// `(word, definition)` is checked on every insert against the senses already stored for
/// the word.
#[derive(Debug, Clone, Default)]
pub struct SenseTable {
    senses: Vec<CanonicalSense>,
    by_word: HashMap<String, Vec<SenseId>>,
}

impl SenseTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(senses: usize) -> Self {
        Self {
            senses: Vec::with_capacity(senses),
            by_word: HashMap::with_capacity(senses),
        }
    }

    /// Append a sense and return its id.
    ///
    /// Fails with [`StoreError::DuplicateSense`] if the pair is already stored; the table is
    /// left untouched in that case.
    pub fn insert(&mut self, word: &str, definition: &str) -> Result<SenseId> {
        if let Some(existing) = self.find(word, definition) {
            return Err(StoreError::DuplicateSense {
                word: word.to_string(),
                definition: definition.to_string(),
                existing,
            });
        }
        let raw = u32::try_from(self.senses.len())
            .map_err(|_| StoreError::CapacityExceeded("senses"))?;
        let id = SenseId::new(raw);
        self.senses.push(CanonicalSense::new(id, word, definition));
        match self.by_word.get_mut(word) {
            Some(ids) => ids.push(id),
            None => {
                self.by_word.insert(word.to_string(), vec![id]);
            }
        }
        Ok(id)
    }

    #[must_use]
    pub fn get(&self, id: SenseId) -> Option<&CanonicalSense> {
        self.senses.get(id.index())
    }

    /// Ids of every sense of `word`, in id order
    #[must_use]
    pub fn ids_for_word(&self, word: &str) -> &[SenseId] {
        self.by_word.get(word).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn find(&self, word: &str, definition: &str) -> Option<SenseId> {
        self.ids_for_word(word)
            .iter()
            .copied()
            .find(|id| self.senses[id.index()].definition == definition)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[CanonicalSense] {
        &self.senses
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.senses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.senses.is_empty()
    }

    #[must_use]
    pub fn word_count(&self) -> usize {
        self.by_word.len()
    }
}

impl AsRef<SenseTable> for SenseTable {
    fn as_ref(&self) -> &SenseTable {
        self
    }
}
