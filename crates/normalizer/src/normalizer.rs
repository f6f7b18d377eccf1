use crate::error::{NormalizerError, Result};
use crate::forms::FormsTable;
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use wordsense_lexicon::Lexeme;
use wordsense_store::SenseStore;

/// Pairs and forms pulled out of one lexeme; computing it touches no shared state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub word: String,
    pub definitions: Vec<String>,
    pub forms: Vec<String>,
    pub dropped_senses: usize,
    pub self_fallback: bool,
}

/// Extract the `(word, definition)` pairs of a lexeme.
///
/// A lexeme without senses defines itself (`(word, word)`). Senses with neither raw nor
/// clean glosses are dropped and counted; if that empties the list, no fallback applies.
#[must_use]
pub fn extract_pairs(lexeme: &Lexeme) -> Extraction {
    let word = lexeme.word().to_string();
    let forms = lexeme.forms().to_vec();

    if lexeme.senses().is_empty() {
        return Extraction {
            definitions: vec![word.clone()],
            word,
            forms,
            dropped_senses: 0,
            self_fallback: true,
        };
    }

    let mut definitions = Vec::with_capacity(lexeme.senses().len());
    let mut dropped_senses = 0;
    for sense in lexeme.senses() {
        match sense.definition() {
            Some(definition) => definitions.push(definition),
            None => {
                log::debug!("Dropping sense without glosses for '{word}'");
                dropped_senses += 1;
            }
        }
    }

    Extraction {
        word,
        definitions,
        forms,
        dropped_senses,
        self_fallback: false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizerConfig {
    /// Lexemes extracted per parallel shard
    pub shard_size: usize,

    /// Stop after this many lexemes
    pub max_lexemes: Option<usize>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            shard_size: 4096,
            max_lexemes: None,
        }
    }
}

impl NormalizerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.shard_size == 0 {
            return Err(NormalizerError::InvalidConfig(
                "shard_size must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeStats {
    pub lexemes: usize,
    pub shards: usize,
    pub emitted_pairs: usize,
    pub duplicate_pairs: usize,
    pub dropped_senses: usize,
    pub self_fallbacks: usize,
    pub senses: usize,
    pub time_ms: u64,
}

/// Result of a normalization pass
#[derive(Debug)]
pub struct NormalizedSenses {
    pub store: SenseStore,
    pub forms: FormsTable,
    pub stats: NormalizeStats,
}

/// Sense normalizer: parallel extraction, sequential id assignment.
///
/// Each shard is extracted on the current rayon pool with an order-preserving collect, then
/// folded on the calling thread. The fold is the only place ids are handed out, so ids follow
/// input order regardless of worker count or shard size.
pub struct SenseNormalizer {
    config: NormalizerConfig,
    pool: Option<Arc<rayon::ThreadPool>>,
    store: SenseStore,
    forms: FormsTable,
    stats: NormalizeStats,
    started: Instant,
}

impl SenseNormalizer {
    pub fn new(config: NormalizerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            pool: None,
            store: SenseStore::new(),
            forms: FormsTable::new(),
            stats: NormalizeStats::default(),
            started: Instant::now(),
        })
    }

    /// Run shard extraction on `pool` instead of the current rayon pool
    #[must_use]
    pub fn with_pool(mut self, pool: Arc<rayon::ThreadPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    #[must_use]
    pub const fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Lexemes still accepted before `max_lexemes` is reached
    #[must_use]
    pub fn remaining(&self) -> Option<usize> {
        self.config
            .max_lexemes
            .map(|max| max.saturating_sub(self.stats.lexemes))
    }

    /// Size of the next shard to pull; 0 once the cutoff is reached
    #[must_use]
    pub fn next_shard_len(&self) -> usize {
        self.remaining()
            .map_or(self.config.shard_size, |left| left.min(self.config.shard_size))
    }

    #[must_use]
    pub const fn stats(&self) -> &NormalizeStats {
        &self.stats
    }

    /// Extract a shard in parallel and fold it into the store. Returns the number of new senses.
    pub fn normalize_shard(&mut self, shard: Vec<Lexeme>) -> Result<usize> {
        let extract = || -> Vec<Extraction> { shard.par_iter().map(extract_pairs).collect() };
        let extractions = match &self.pool {
            Some(pool) => pool.install(extract),
            None => extract(),
        };
        self.stats.shards += 1;
        let before = self.store.sense_count();
        for extraction in extractions {
            self.fold(extraction)?;
        }
        let added = self.store.sense_count() - before;
        log::debug!(
            "Shard {}: {} lexemes, {added} new senses",
            self.stats.shards,
            shard.len()
        );
        Ok(added)
    }

    fn fold(&mut self, extraction: Extraction) -> Result<()> {
        let Extraction {
            word,
            definitions,
            forms,
            dropped_senses,
            self_fallback,
        } = extraction;

        self.stats.lexemes += 1;
        self.stats.dropped_senses += dropped_senses;
        self.stats.self_fallbacks += usize::from(self_fallback);
        self.forms.extend(&word, forms);

        for definition in definitions {
            self.stats.emitted_pairs += 1;
            if self.store.find_sense(&word, &definition).is_some() {
                self.stats.duplicate_pairs += 1;
                continue;
            }
            self.store.insert_sense(&word, &definition)?;
        }
        Ok(())
    }

    /// Drain `input` shard by shard, honouring `max_lexemes`
    pub fn normalize<I>(self, input: I) -> Result<NormalizedSenses>
    where
        I: IntoIterator<Item = Lexeme>,
    {
        self.normalize_with(input, |_| false, |_| {})
    }

    /// Like [`normalize`](Self::normalize), but asks `stop` before every shard and reports the
    /// lexeme count of every folded shard to `on_shard`. Stopping keeps what was folded so far.
    pub fn normalize_with<I, S, F>(
        mut self,
        input: I,
        mut stop: S,
        mut on_shard: F,
    ) -> Result<NormalizedSenses>
    where
        I: IntoIterator<Item = Lexeme>,
        S: FnMut(&NormalizeStats) -> bool,
        F: FnMut(usize),
    {
        let mut input = input.into_iter();
        loop {
            if stop(&self.stats) {
                log::debug!("Normalization stopped after {} lexemes", self.stats.lexemes);
                break;
            }
            let take = self.next_shard_len();
            if take == 0 {
                log::info!("Lexeme cutoff reached after {} lexemes", self.stats.lexemes);
                break;
            }
            let shard: Vec<Lexeme> = input.by_ref().take(take).collect();
            if shard.is_empty() {
                break;
            }
            let count = shard.len();
            self.normalize_shard(shard)?;
            on_shard(count);
        }
        Ok(self.finish())
    }

    #[must_use]
    pub fn finish(mut self) -> NormalizedSenses {
        self.stats.senses = self.store.sense_count();
        self.stats.time_ms = self.started.elapsed().as_millis() as u64;
        log::info!(
            "Normalized {} lexemes into {} senses ({} duplicates, {} glossless senses dropped)",
            self.stats.lexemes,
            self.stats.senses,
            self.stats.duplicate_pairs,
            self.stats.dropped_senses
        );
        NormalizedSenses {
            store: self.store,
            forms: self.forms,
            stats: self.stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wordsense_lexicon::{SenseId, SenseRaw};

    fn sense(gloss: &str) -> SenseRaw {
        SenseRaw::new(vec![gloss.to_string()], Vec::new())
    }

    fn lexeme(word: &str, senses: Vec<SenseRaw>) -> Lexeme {
        Lexeme::new(word, Vec::new(), senses).unwrap()
    }

    fn pairs(store: &SenseStore) -> Vec<(u32, String, String)> {
        store
            .senses()
            .iter()
            .map(|s| (s.id.get(), s.word.clone(), s.definition.clone()))
            .collect()
    }

    #[test]
    fn lexeme_without_senses_defines_itself() {
        let out = SenseNormalizer::new(NormalizerConfig::default())
            .unwrap()
            .normalize(vec![lexeme("aberrant", Vec::new())])
            .unwrap();
        assert_eq!(
            pairs(&out.store),
            vec![(0, "aberrant".to_string(), "aberrant".to_string())]
        );
        assert_eq!(out.store.senses()[0].text, "aberrant. aberrant");
        assert_eq!(out.stats.self_fallbacks, 1);
    }

    #[test]
    fn duplicates_keep_the_first_id() {
        let input = vec![
            lexeme("odd", vec![sense("strange"), sense("uneven")]),
            lexeme("even", vec![sense("flat")]),
            lexeme("odd", vec![sense("uneven"), sense("left over")]),
        ];
        let out = SenseNormalizer::new(NormalizerConfig::default())
            .unwrap()
            .normalize(input)
            .unwrap();

        assert_eq!(
            pairs(&out.store),
            vec![
                (0, "odd".to_string(), "strange".to_string()),
                (1, "odd".to_string(), "uneven".to_string()),
                (2, "even".to_string(), "flat".to_string()),
                (3, "odd".to_string(), "left over".to_string()),
            ]
        );
        assert_eq!(out.stats.emitted_pairs, 5);
        assert_eq!(out.stats.duplicate_pairs, 1);
        assert_eq!(
            out.store.senses_for_word("odd").iter().map(|id| id.get()).collect::<Vec<_>>(),
            vec![0, 1, 3]
        );
    }

    #[test]
    fn glossless_senses_are_dropped_without_fallback() {
        let input = vec![lexeme("blank", vec![SenseRaw::default()])];
        let out = SenseNormalizer::new(NormalizerConfig::default())
            .unwrap()
            .normalize(input)
            .unwrap();
        assert_eq!(out.store.sense_count(), 0);
        assert_eq!(out.stats.dropped_senses, 1);
        assert_eq!(out.forms.get("blank").unwrap(), &["blank".to_string()]);
    }

    #[test]
    fn max_lexemes_cuts_the_stream() {
        let input = (0..10).map(|i| lexeme(&format!("w{i}"), Vec::new()));
        let config = NormalizerConfig {
            shard_size: 3,
            max_lexemes: Some(4),
        };
        let out = SenseNormalizer::new(config).unwrap().normalize(input).unwrap();
        assert_eq!(out.stats.lexemes, 4);
        assert_eq!(out.stats.shards, 2);
        assert_eq!(out.store.sense_count(), 4);
    }

    #[test]
    fn duplicates_are_found_across_shards() {
        let input = vec![
            lexeme("odd", vec![sense("strange")]),
            lexeme("even", vec![sense("flat")]),
            lexeme("odd", vec![sense("strange")]),
        ];
        let config = NormalizerConfig {
            shard_size: 1,
            max_lexemes: None,
        };
        let out = SenseNormalizer::new(config).unwrap().normalize(input).unwrap();
        assert_eq!(out.stats.shards, 3);
        assert_eq!(out.stats.emitted_pairs, 3);
        assert_eq!(out.stats.duplicate_pairs, 1);
        assert_eq!(out.store.find_sense("odd", "strange"), Some(SenseId::new(0)));
        assert_eq!(out.store.sense_count(), 2);
    }

    #[test]
    fn stop_keeps_folded_shards_and_reports_each_one() {
        let input = (0..10).map(|i| lexeme(&format!("w{i}"), Vec::new()));
        let config = NormalizerConfig {
            shard_size: 3,
            max_lexemes: None,
        };
        let mut shards = Vec::new();
        let out = SenseNormalizer::new(config)
            .unwrap()
            .normalize_with(input, |stats| stats.lexemes >= 5, |count| shards.push(count))
            .unwrap();
        assert_eq!(shards, vec![3, 3]);
        assert_eq!(out.stats.lexemes, 6);
        assert_eq!(out.store.sense_count(), 6);
    }

    #[test]
    fn cutoff_applies_under_normalize_with() {
        let input = (0..10).map(|i| lexeme(&format!("w{i}"), Vec::new()));
        let config = NormalizerConfig {
            shard_size: 3,
            max_lexemes: Some(4),
        };
        let mut shards = Vec::new();
        let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let out = SenseNormalizer::new(config)
            .unwrap()
            .with_pool(Arc::new(pool))
            .normalize_with(input, |_| false, |count| shards.push(count))
            .unwrap();
        assert_eq!(shards, vec![3, 1]);
        assert_eq!(out.stats.lexemes, 4);
    }

    #[test]
    fn rejects_zero_shard_size() {
        let config = NormalizerConfig {
            shard_size: 0,
            max_lexemes: None,
        };
        assert!(SenseNormalizer::new(config).is_err());
    }
}
