use crate::error::Result;
use crate::relations::{RelationTable, RelationWriter};
use crate::senses::SenseTable;
use sha2::{Digest, Sha256};
use wordsense_lexicon::{CanonicalSense, RelationId, ResolvedRelation, SenseId};

/// Canonical senses plus resolved relations for one build.
///
/// The sense table is filled by normalization and frozen before resolution starts; relations
/// are appended through a [`RelationWriter`] obtained from [`SenseStore::parts_mut`], which
/// keeps the sense table readable by resolver workers while the writer holds the relation
/// table.
#[derive(Debug, Clone, Default)]
pub struct SenseStore {
    senses: SenseTable,
    relations: RelationTable,
}

impl SenseStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_tables(senses: SenseTable, relations: RelationTable) -> Self {
        Self { senses, relations }
    }

    /// Append a canonical sense; duplicates of `(word, definition)` fail the insert
    pub fn insert_sense(&mut self, word: &str, definition: &str) -> Result<SenseId> {
        self.senses.insert(word, definition)
    }

    #[must_use]
    pub fn sense(&self, id: SenseId) -> Option<&CanonicalSense> {
        self.senses.get(id)
    }

    #[must_use]
    pub fn senses_for_word(&self, word: &str) -> &[SenseId] {
        self.senses.ids_for_word(word)
    }

    #[must_use]
    pub fn find_sense(&self, word: &str, definition: &str) -> Option<SenseId> {
        self.senses.find(word, definition)
    }

    /// Every canonical sense in id order
    #[must_use]
    pub fn senses(&self) -> &[CanonicalSense] {
        self.senses.as_slice()
    }

    #[must_use]
    pub const fn sense_table(&self) -> &SenseTable {
        &self.senses
    }

    #[must_use]
    pub fn relation(&self, id: RelationId) -> Option<&ResolvedRelation> {
        self.relations.get(id)
    }

    /// Every resolved relation in id order
    #[must_use]
    pub fn relations(&self) -> &[ResolvedRelation] {
        self.relations.as_slice()
    }

    pub fn relations_from<'a>(
        &'a self,
        source_word: &'a str,
    ) -> impl Iterator<Item = &'a ResolvedRelation> + 'a {
        self.relations()
            .iter()
            .filter(move |r| r.source_word == source_word)
    }

    pub fn relations_to_sense(&self, sense: SenseId) -> impl Iterator<Item = &ResolvedRelation> {
        self.relations()
            .iter()
            .filter(move |r| r.matched_sense_id == Some(sense))
    }

    /// Shared sense table plus an exclusive handle on the relation table
    pub fn parts_mut(&mut self) -> (&SenseTable, &mut RelationTable) {
        (&self.senses, &mut self.relations)
    }

    pub fn relation_writer(&mut self) -> RelationWriter<'_> {
        let (senses, relations) = self.parts_mut();
        relations.writer(senses)
    }

    #[must_use]
    pub fn sense_count(&self) -> usize {
        self.senses.len()
    }

    #[must_use]
    pub fn word_count(&self) -> usize {
        self.senses.word_count()
    }

    #[must_use]
    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    /// SHA-256 over both ordered tables, hex encoded.
    ///
    /// Two builds over the same input produce the same fingerprint.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for sense in self.senses() {
            hasher.update(sense.id.get().to_le_bytes());
            hash_field(&mut hasher, &sense.word);
            hash_field(&mut hasher, &sense.definition);
        }
        hasher.update([0xff]);
        for relation in self.relations() {
            hasher.update(relation.id.get().to_le_bytes());
            hash_field(&mut hasher, &relation.source_word);
            hash_field(&mut hasher, relation.relation_type.as_str());
            hash_field(&mut hasher, &relation.target_word);
            hash_field(&mut hasher, &relation.gloss_fragment);
            match relation.matched_sense_id {
                Some(id) => {
                    hasher.update([1]);
                    hasher.update(id.get().to_le_bytes());
                }
                None => hasher.update([0]),
            }
            hasher.update(relation.score.to_bits().to_le_bytes());
            hasher.update([u8::from(relation.ambiguous)]);
        }
        format!("{:x}", hasher.finalize())
    }
}

impl AsRef<SenseTable> for SenseStore {
    fn as_ref(&self) -> &SenseTable {
        &self.senses
    }
}

fn hash_field(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relations::RelationDraft;
    use pretty_assertions::assert_eq;
    use wordsense_lexicon::{RelationRaw, RelationType};

    fn store() -> SenseStore {
        let mut store = SenseStore::new();
        store.insert_sense("aberrant", "straying").unwrap();
        store.insert_sense("odd", "strange").unwrap();
        store
    }

    fn commit(store: &mut SenseStore, source: &str, target: &str, matched: Option<SenseId>) {
        let raw = RelationRaw::new(source, RelationType::Synonym, target, "").unwrap();
        let mut writer = store.relation_writer();
        writer
            .stage(RelationDraft::from_raw(&raw, matched, 0.5, false))
            .unwrap();
        writer.flush().unwrap();
    }

    #[test]
    fn relation_queries_filter_by_source_and_sense() {
        let mut store = store();
        commit(&mut store, "odd", "aberrant", Some(SenseId::new(0)));
        commit(&mut store, "weird", "odd", Some(SenseId::new(1)));
        commit(&mut store, "odd", "zzz", None);

        let from_odd: Vec<u32> = store.relations_from("odd").map(|r| r.id.get()).collect();
        assert_eq!(from_odd, vec![0, 2]);
        let to_odd: Vec<u32> = store
            .relations_to_sense(SenseId::new(1))
            .map(|r| r.id.get())
            .collect();
        assert_eq!(to_odd, vec![1]);
    }

    #[test]
    fn fingerprint_tracks_content() {
        let mut a = store();
        let b = store();
        assert_eq!(a.fingerprint(), b.fingerprint());

        commit(&mut a, "odd", "aberrant", Some(SenseId::new(0)));
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }
}
