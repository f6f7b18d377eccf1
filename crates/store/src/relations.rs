use crate::error::{Result, StoreError};
use crate::senses::SenseTable;
use std::ops::Range;
use wordsense_lexicon::{RelationId, RelationRaw, RelationType, ResolvedRelation, SenseId};

/// A resolution result waiting for its relation id
#[derive(Debug, Clone, PartialEq)]
pub struct RelationDraft {
    pub source_word: String,
    pub relation_type: RelationType,
    pub target_word: String,
    pub gloss_fragment: String,
    pub matched_sense_id: Option<SenseId>,
    pub score: f32,
    pub ambiguous: bool,
}

impl RelationDraft {
    /// Draft for `relation` with the given match outcome
    #[must_use]
    pub fn from_raw(
        relation: &RelationRaw,
        matched_sense_id: Option<SenseId>,
        score: f32,
        ambiguous: bool,
    ) -> Self {
        Self {
            source_word: relation.source_word().to_string(),
            relation_type: relation.relation_type().clone(),
            target_word: relation.target_word().to_string(),
            gloss_fragment: relation.gloss_fragment().to_string(),
            matched_sense_id,
            score,
            ambiguous,
        }
    }

    fn into_resolved(self, id: RelationId) -> ResolvedRelation {
        ResolvedRelation {
            id,
            source_word: self.source_word,
            relation_type: self.relation_type,
            target_word: self.target_word,
            gloss_fragment: self.gloss_fragment,
            matched_sense_id: self.matched_sense_id,
            score: self.score,
            ambiguous: self.ambiguous,
        }
    }
}

/// Append-only table of resolved relations; ids are positions
#[derive(Debug, Clone, Default)]
pub struct RelationTable {
    relations: Vec<ResolvedRelation>,
}

impl RelationTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a staged writer. Drafts become visible only on [`RelationWriter::flush`].
    pub fn writer<'a>(&'a mut self, senses: &'a SenseTable) -> RelationWriter<'a> {
        RelationWriter {
            senses,
            relations: self,
            staged: Vec::new(),
        }
    }

    #[must_use]
    pub fn get(&self, id: RelationId) -> Option<&ResolvedRelation> {
        self.relations.get(id.get() as usize)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[ResolvedRelation] {
        &self.relations
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    pub(crate) fn push_verified(&mut self, relation: ResolvedRelation) {
        self.relations.push(relation);
    }
}

/// Single writer for the relation table.
///
/// Drafts are checked for referential integrity when staged and appended together on
/// `flush`, so a reader never observes a half-written batch. Drafts still staged when the
/// writer is dropped are discarded.
pub struct RelationWriter<'a> {
    senses: &'a SenseTable,
    relations: &'a mut RelationTable,
    staged: Vec<RelationDraft>,
}

impl RelationWriter<'_> {
    pub fn stage(&mut self, draft: RelationDraft) -> Result<()> {
        check_reference(self.senses, draft.matched_sense_id, &draft.target_word)?;
        self.staged.push(draft);
        Ok(())
    }

    pub fn stage_all(&mut self, drafts: impl IntoIterator<Item = RelationDraft>) -> Result<()> {
        for draft in drafts {
            self.stage(draft)?;
        }
        Ok(())
    }

    /// Commit every staged draft, assigning ids in staging order
    pub fn flush(&mut self) -> Result<Range<RelationId>> {
        let start = self.relations.len();
        let end = start + self.staged.len();
        let start_id = u32::try_from(start).map_err(|_| StoreError::CapacityExceeded("relations"))?;
        let end_id = u32::try_from(end).map_err(|_| StoreError::CapacityExceeded("relations"))?;

        for (offset, draft) in self.staged.drain(..).enumerate() {
            let id = RelationId(start_id + offset as u32);
            self.relations.push_verified(draft.into_resolved(id));
        }
        log::debug!("Flushed relations {start}..{end}");
        Ok(RelationId(start_id)..RelationId(end_id))
    }

    /// Drop staged drafts without committing them
    pub fn discard(&mut self) -> usize {
        let dropped = self.staged.len();
        self.staged.clear();
        dropped
    }

    #[must_use]
    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    #[must_use]
    pub fn committed_len(&self) -> usize {
        self.relations.len()
    }
}

pub(crate) fn check_reference(
    senses: &SenseTable,
    matched: Option<SenseId>,
    target_word: &str,
) -> Result<()> {
    let Some(id) = matched else {
        return Ok(());
    };
    let sense = senses.get(id).ok_or(StoreError::UnknownSense(id))?;
    if sense.word != target_word {
        return Err(StoreError::WordMismatch {
            sense: id,
            expected: target_word.to_string(),
            actual: sense.word.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn draft(target: &str, matched: Option<SenseId>) -> RelationDraft {
        let raw = RelationRaw::new("odd", RelationType::Synonym, target, "").unwrap();
        RelationDraft::from_raw(&raw, matched, 1.0, false)
    }

    fn senses() -> SenseTable {
        let mut table = SenseTable::new();
        table.insert("aberrant", "straying").unwrap();
        table.insert("normal", "usual").unwrap();
        table
    }

    #[test]
    fn staged_drafts_are_invisible_until_flush() {
        let senses = senses();
        let mut table = RelationTable::new();
        let mut writer = table.writer(&senses);
        writer.stage(draft("aberrant", Some(SenseId::new(0)))).unwrap();
        writer.stage(draft("zzz", None)).unwrap();
        assert_eq!(writer.committed_len(), 0);

        let range = writer.flush().unwrap();
        assert_eq!(range, RelationId(0)..RelationId(2));
        assert_eq!(writer.staged_len(), 0);
        drop(writer);

        assert_eq!(table.len(), 2);
        assert_eq!(table.get(RelationId(1)).unwrap().matched_sense_id, None);
    }

    #[test]
    fn dropped_writer_discards_staged_drafts() {
        let senses = senses();
        let mut table = RelationTable::new();
        {
            let mut writer = table.writer(&senses);
            writer.stage(draft("aberrant", Some(SenseId::new(0)))).unwrap();
            writer.flush().unwrap();
            writer.stage(draft("normal", Some(SenseId::new(1)))).unwrap();
        }
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn rejects_references_to_other_words_or_unknown_ids() {
        let senses = senses();
        let mut table = RelationTable::new();
        let mut writer = table.writer(&senses);

        let err = writer.stage(draft("aberrant", Some(SenseId::new(1)))).unwrap_err();
        assert!(matches!(err, StoreError::WordMismatch { .. }));

        let err = writer.stage(draft("aberrant", Some(SenseId::new(9)))).unwrap_err();
        assert!(matches!(err, StoreError::UnknownSense(_)));
        assert_eq!(writer.staged_len(), 0);
    }
}
