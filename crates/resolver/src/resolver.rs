use crate::error::{ResolverError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use wordsense_index::SenseIndex;
use wordsense_lexicon::{RelationRaw, SenseId};
use wordsense_store::{RelationDraft, SenseTable};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// A ranking is ambiguous when `best - second <= ambiguity_tolerance * best`
    pub ambiguity_tolerance: f32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            ambiguity_tolerance: 0.05,
        }
    }
}

impl ResolverConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.ambiguity_tolerance) {
            return Err(ResolverError::InvalidConfig(format!(
                "ambiguity_tolerance must be within [0, 1), got {}",
                self.ambiguity_tolerance
            )));
        }
        Ok(())
    }
}

/// How a relation target was matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum ResolutionOutcome {
    /// The target word has no senses
    Unmatched,
    /// The target word has exactly one sense
    Unique,
    /// Several senses were ranked against the gloss
    Ranked { ambiguous: bool },
}

impl ResolutionOutcome {
    #[must_use]
    pub const fn is_ambiguous(self) -> bool {
        matches!(self, Self::Ranked { ambiguous: true })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankedCandidate {
    pub sense: SenseId,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub outcome: ResolutionOutcome,
    pub draft: RelationDraft,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolveStats {
    pub relations: usize,
    pub unmatched: usize,
    pub unique: usize,
    pub ranked: usize,
    pub ambiguous: usize,
}

impl ResolveStats {
    pub fn record(&mut self, outcome: ResolutionOutcome) {
        self.relations += 1;
        match outcome {
            ResolutionOutcome::Unmatched => self.unmatched += 1,
            ResolutionOutcome::Unique => self.unique += 1,
            ResolutionOutcome::Ranked { ambiguous } => {
                self.ranked += 1;
                self.ambiguous += usize::from(ambiguous);
            }
        }
    }

    pub fn merge(&mut self, other: &Self) {
        self.relations += other.relations;
        self.unmatched += other.unmatched;
        self.unique += other.unique;
        self.ranked += other.ranked;
        self.ambiguous += other.ambiguous;
    }
}

/// Query text used to rank the senses of a relation target
#[must_use]
pub fn relation_query(relation: &RelationRaw) -> String {
    format!("{}. {}", relation.target_word(), relation.gloss_fragment())
}

/// Resolves relation targets to canonical senses.
///
/// Candidates are restricted to the senses of the exact target word first; only those are
/// scored, never the whole corpus. Reads only frozen state, so one resolver can be shared by
/// every worker of a rayon pool.
#[derive(Debug, Clone, Copy)]
pub struct RelationResolver<'a> {
    senses: &'a SenseTable,
    index: &'a SenseIndex,
    config: ResolverConfig,
}

impl<'a> RelationResolver<'a> {
    /// `senses` is a [`SenseTable`] or anything exposing one, such as a `SenseStore`.
    /// The index must have been built over exactly that table.
    pub fn new<S>(senses: &'a S, index: &'a SenseIndex, config: ResolverConfig) -> Result<Self>
    where
        S: AsRef<SenseTable> + ?Sized,
    {
        config.validate()?;
        let senses = senses.as_ref();
        if index.doc_count() != senses.len() {
            return Err(ResolverError::IndexMismatch {
                index_docs: index.doc_count(),
                senses: senses.len(),
            });
        }
        Ok(Self {
            senses,
            index,
            config,
        })
    }

    #[must_use]
    pub const fn config(&self) -> ResolverConfig {
        self.config
    }

    /// Every candidate of the target word scored against the relation query, best first.
    /// Equal scores are ordered by ascending sense id.
    #[must_use]
    pub fn rank_candidates(&self, relation: &RelationRaw) -> Vec<RankedCandidate> {
        let candidates = self.senses.ids_for_word(relation.target_word());
        if candidates.is_empty() {
            return Vec::new();
        }
        let query = self.index.prepare(&relation_query(relation));
        let mut ranked: Vec<RankedCandidate> = candidates
            .iter()
            .map(|&sense| RankedCandidate {
                sense,
                score: self.index.score(&query, sense),
            })
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.sense.cmp(&b.sense)));
        ranked
    }

    pub fn resolve(&self, relation: &RelationRaw) -> Resolution {
        let ranked = self.rank_candidates(relation);
        let (outcome, matched, score) = match ranked.as_slice() {
            [] => (ResolutionOutcome::Unmatched, None, 0.0),
            [only] => (ResolutionOutcome::Unique, Some(only.sense), only.score),
            [best, second, ..] => {
                let ambiguous =
                    best.score - second.score <= self.config.ambiguity_tolerance * best.score;
                (
                    ResolutionOutcome::Ranked { ambiguous },
                    Some(best.sense),
                    best.score,
                )
            }
        };
        if outcome.is_ambiguous() {
            log::debug!(
                "Ambiguous target '{}' for '{}' ({} candidates)",
                relation.target_word(),
                relation.source_word(),
                ranked.len()
            );
        }
        Resolution {
            outcome,
            draft: RelationDraft::from_raw(relation, matched, score, outcome.is_ambiguous()),
        }
    }

    /// Resolve a batch on the current rayon pool; output order follows input order
    #[must_use]
    pub fn resolve_batch(&self, relations: &[RelationRaw]) -> Vec<Resolution> {
        relations.par_iter().map(|r| self.resolve(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wordsense_index::Bm25Params;
    use wordsense_lexicon::RelationType;

    fn table(items: &[(&str, &str)]) -> SenseTable {
        let mut table = SenseTable::new();
        for (word, definition) in items {
            table.insert(word, definition).unwrap();
        }
        table
    }

    fn relation(target: &str, gloss: &str) -> RelationRaw {
        RelationRaw::new("source", RelationType::Synonym, target, gloss).unwrap()
    }

    #[test]
    fn no_candidates_resolves_to_null() {
        let senses = table(&[("odd", "strange")]);
        let index = SenseIndex::build(senses.as_slice(), Bm25Params::default()).unwrap();
        let resolver = RelationResolver::new(&senses, &index, ResolverConfig::default()).unwrap();

        let resolution = resolver.resolve(&relation("zzznonexistent", "x"));
        assert_eq!(resolution.outcome, ResolutionOutcome::Unmatched);
        assert_eq!(resolution.draft.matched_sense_id, None);
        assert_eq!(resolution.draft.score, 0.0);
        assert!(!resolution.draft.ambiguous);
    }

    #[test]
    fn single_candidate_is_a_trivial_match() {
        let senses = table(&[("odd", "strange"), ("even", "flat")]);
        let index = SenseIndex::build(senses.as_slice(), Bm25Params::default()).unwrap();
        let resolver = RelationResolver::new(&senses, &index, ResolverConfig::default()).unwrap();

        let resolution = resolver.resolve(&relation("even", "unrelated words"));
        assert_eq!(resolution.outcome, ResolutionOutcome::Unique);
        assert_eq!(resolution.draft.matched_sense_id, Some(SenseId::new(1)));
        assert!(resolution.draft.score > 0.0);
    }

    #[test]
    fn equal_scores_pick_the_lowest_id() {
        let senses = table(&[("odd", "not even"), ("odd", "even, not"), ("even", "flat")]);
        let index = SenseIndex::build(senses.as_slice(), Bm25Params::default()).unwrap();
        let resolver = RelationResolver::new(&senses, &index, ResolverConfig::default()).unwrap();

        let ranked = resolver.rank_candidates(&relation("odd", "not"));
        assert_eq!(ranked[0].score, ranked[1].score);
        assert_eq!(ranked[0].sense, SenseId::new(0));

        let resolution = resolver.resolve(&relation("odd", "not"));
        assert_eq!(resolution.draft.matched_sense_id, Some(SenseId::new(0)));
        assert_eq!(resolution.outcome, ResolutionOutcome::Ranked { ambiguous: true });
    }

    #[test]
    fn identical_scores_are_ambiguous_without_tolerance() {
        let senses = table(&[("odd", "strange"), ("odd", "uneven")]);
        let index = SenseIndex::build(senses.as_slice(), Bm25Params::default()).unwrap();
        let config = ResolverConfig {
            ambiguity_tolerance: 0.0,
        };
        let resolver = RelationResolver::new(&senses, &index, config).unwrap();

        let resolution = resolver.resolve(&relation("odd", "qqq"));
        assert_eq!(resolution.draft.matched_sense_id, Some(SenseId::new(0)));
        assert!(resolution.draft.ambiguous);
    }

    #[test]
    fn clear_winner_is_not_ambiguous() {
        let senses = table(&[
            ("bank", "the side of a river"),
            ("bank", "an institution that keeps money"),
        ]);
        let index = SenseIndex::build(senses.as_slice(), Bm25Params::default()).unwrap();
        let resolver = RelationResolver::new(&senses, &index, ResolverConfig::default()).unwrap();

        let resolution = resolver.resolve(&relation("bank", "keeps money"));
        assert_eq!(resolution.draft.matched_sense_id, Some(SenseId::new(1)));
        assert_eq!(resolution.outcome, ResolutionOutcome::Ranked { ambiguous: false });
    }

    #[test]
    fn batch_preserves_input_order() {
        let senses = table(&[("odd", "strange"), ("even", "flat")]);
        let index = SenseIndex::build(senses.as_slice(), Bm25Params::default()).unwrap();
        let resolver = RelationResolver::new(&senses, &index, ResolverConfig::default()).unwrap();

        let batch = vec![relation("even", ""), relation("missing", ""), relation("odd", "")];
        let matched: Vec<Option<SenseId>> = resolver
            .resolve_batch(&batch)
            .into_iter()
            .map(|r| r.draft.matched_sense_id)
            .collect();
        assert_eq!(matched, vec![Some(SenseId::new(1)), None, Some(SenseId::new(0))]);
    }

    #[test]
    fn rejects_index_over_another_table() {
        let senses = table(&[("odd", "strange")]);
        let index = SenseIndex::build(&[], Bm25Params::default()).unwrap();
        let err = RelationResolver::new(&senses, &index, ResolverConfig::default()).unwrap_err();
        assert!(matches!(err, ResolverError::IndexMismatch { index_docs: 0, senses: 1 }));
    }

    #[test]
    fn stats_count_outcomes() {
        let mut stats = ResolveStats::default();
        stats.record(ResolutionOutcome::Unmatched);
        stats.record(ResolutionOutcome::Unique);
        stats.record(ResolutionOutcome::Ranked { ambiguous: true });
        stats.record(ResolutionOutcome::Ranked { ambiguous: false });
        assert_eq!(
            stats,
            ResolveStats {
                relations: 4,
                unmatched: 1,
                unique: 1,
                ranked: 2,
                ambiguous: 1,
            }
        );
    }
}
