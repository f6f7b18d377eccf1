use crate::cancel::CancelFlag;
use crate::config::BuildConfig;
use crate::error::{EngineError, Result};
use crate::observer::{BuildObserver, Phase};
use serde::Serialize;
use std::sync::{mpsc, Arc};
use std::time::Instant;
use wordsense_index::{IndexStats, SenseIndex};
use wordsense_lexicon::{Lexeme, RelationRaw};
use wordsense_normalizer::{FormsTable, NormalizeStats, NormalizedSenses, SenseNormalizer};
use wordsense_resolver::{RelationResolver, ResolveStats};
use wordsense_store::{RelationDraft, SenseStore};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhaseTimings {
    pub normalize_ms: u64,
    pub index_ms: u64,
    pub resolve_ms: u64,
    pub total_ms: u64,
}

/// Outcome of the resolution phase
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvePhase {
    pub stats: ResolveStats,
    pub batches: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub workers: usize,
    pub normalize: NormalizeStats,
    pub index: IndexStats,
    pub resolve: ResolveStats,
    pub batches_committed: usize,
    pub senses: usize,
    pub relations: usize,
    pub cancelled: bool,
    pub timings: PhaseTimings,
    pub fingerprint: String,
}

#[derive(Debug)]
pub struct BuildOutput {
    pub store: SenseStore,
    pub forms: FormsTable,
    pub index: SenseIndex,
    pub report: BuildReport,
}

/// Normalize → index → resolve, on a dedicated rayon pool.
///
/// Ids are handed out at exactly two points, the normalizer fold and the relation writer, and
/// both consume worker output in input order. Output is therefore identical for any worker
/// count, shard size or batch size.
pub struct BuildPipeline {
    config: BuildConfig,
    pool: Arc<rayon::ThreadPool>,
    cancel: CancelFlag,
}

impl BuildPipeline {
    pub fn new(config: BuildConfig) -> Result<Self> {
        config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|i| format!("wordsense-worker-{i}"))
            .build()?;
        log::debug!("Worker pool started with {} threads", config.workers);
        Ok(Self {
            config,
            pool: Arc::new(pool),
            cancel: CancelFlag::new(),
        })
    }

    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    #[must_use]
    pub const fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn normalize<I>(&self, lexemes: I, observer: &dyn BuildObserver) -> Result<NormalizedSenses>
    where
        I: IntoIterator<Item = Lexeme>,
    {
        let normalizer =
            SenseNormalizer::new(self.config.normalizer)?.with_pool(Arc::clone(&self.pool));
        let normalized = normalizer.normalize_with(
            lexemes,
            |stats| {
                let cancelled = self.cancel.is_cancelled();
                if cancelled {
                    log::warn!("Normalization cancelled after {} lexemes", stats.lexemes);
                }
                cancelled
            },
            |count| observer.lexemes_normalized(count),
        )?;
        Ok(normalized)
    }

    /// Build the BM25 index over the store's senses. Any failure aborts the build.
    pub fn build_index(&self, store: &SenseStore) -> Result<SenseIndex> {
        let settings = self.config.index;
        let index = self.pool.install(|| {
            SenseIndex::build_parallel(store.senses(), settings.params, settings.shard_size)
        })?;
        Ok(index)
    }

    /// Resolve `relations` into the store's relation table.
    ///
    /// Batches are resolved on the pool and queued to one writer thread, which stages and
    /// flushes each batch whole. On cancellation or cutoff the queue is drained, so every
    /// batch that was handed over is committed and nothing else is.
    pub fn resolve<I>(
        &self,
        store: &mut SenseStore,
        index: &SenseIndex,
        relations: I,
        observer: &dyn BuildObserver,
    ) -> Result<ResolvePhase>
    where
        I: IntoIterator<Item = RelationRaw>,
    {
        let settings = self.config.resolver;
        let (senses, table) = store.parts_mut();
        let resolver = RelationResolver::new(senses, index, settings.config)?;
        let (tx, rx) = mpsc::sync_channel::<Vec<RelationDraft>>(settings.queue_depth);

        std::thread::scope(|scope| {
            let writer = scope.spawn(move || -> Result<usize> {
                let mut writer = table.writer(senses);
                let mut batches = 0;
                for drafts in rx {
                    writer.stage_all(drafts)?;
                    let committed = writer.flush()?;
                    log::debug!(
                        "Committed relations {}..{}",
                        committed.start.get(),
                        committed.end.get()
                    );
                    batches += 1;
                }
                Ok(batches)
            });

            let stats = self.produce(&resolver, relations, &tx, observer);
            drop(tx);
            let batches = writer.join().map_err(|_| EngineError::WriterPanicked)??;
            Ok(ResolvePhase { stats, batches })
        })
    }

    fn produce<I>(
        &self,
        resolver: &RelationResolver<'_>,
        relations: I,
        tx: &mpsc::SyncSender<Vec<RelationDraft>>,
        observer: &dyn BuildObserver,
    ) -> ResolveStats
    where
        I: IntoIterator<Item = RelationRaw>,
    {
        let settings = self.config.resolver;
        let mut stats = ResolveStats::default();
        let mut input = relations.into_iter();
        loop {
            if self.cancel.is_cancelled() {
                log::warn!("Resolution cancelled after {} relations", stats.relations);
                break;
            }
            let take = settings.max_relations.map_or(settings.batch_size, |max| {
                max.saturating_sub(stats.relations).min(settings.batch_size)
            });
            if take == 0 {
                log::info!("Relation cutoff reached after {} relations", stats.relations);
                break;
            }
            let batch: Vec<RelationRaw> = input.by_ref().take(take).collect();
            if batch.is_empty() {
                break;
            }

            let resolutions = self.pool.install(|| resolver.resolve_batch(&batch));
            let mut batch_stats = ResolveStats::default();
            let drafts: Vec<RelationDraft> = resolutions
                .into_iter()
                .map(|resolution| {
                    batch_stats.record(resolution.outcome);
                    resolution.draft
                })
                .collect();
            if tx.send(drafts).is_err() {
                log::warn!("Relation writer stopped; dropping remaining input");
                break;
            }
            stats.merge(&batch_stats);
            observer.relations_resolved(batch.len());
        }
        stats
    }

    /// Run all three phases. A cancelled build still returns a consistent store holding
    /// whatever was committed before the flag was seen.
    pub fn run<L, R>(
        &self,
        lexemes: L,
        relations: R,
        observer: &dyn BuildObserver,
    ) -> Result<BuildOutput>
    where
        L: IntoIterator<Item = Lexeme>,
        R: IntoIterator<Item = RelationRaw>,
    {
        let started = Instant::now();
        let mut timings = PhaseTimings::default();

        observer.phase_started(Phase::Normalize);
        let phase = Instant::now();
        let NormalizedSenses {
            mut store,
            forms,
            stats: normalize,
        } = self.normalize(lexemes, observer)?;
        timings.normalize_ms = elapsed_ms(phase);
        observer.phase_finished(Phase::Normalize);

        observer.phase_started(Phase::Index);
        let phase = Instant::now();
        let index = self.build_index(&store)?;
        timings.index_ms = elapsed_ms(phase);
        observer.phase_finished(Phase::Index);

        let resolve = if self.cancel.is_cancelled() {
            log::warn!("Build cancelled; skipping relation resolution");
            ResolvePhase::default()
        } else {
            observer.phase_started(Phase::Resolve);
            let phase = Instant::now();
            let resolve = self.resolve(&mut store, &index, relations, observer)?;
            timings.resolve_ms = elapsed_ms(phase);
            observer.phase_finished(Phase::Resolve);
            resolve
        };
        timings.total_ms = elapsed_ms(started);

        let report = BuildReport {
            workers: self.config.workers,
            normalize,
            index: index.stats(),
            resolve: resolve.stats,
            batches_committed: resolve.batches,
            senses: store.sense_count(),
            relations: store.relation_count(),
            cancelled: self.cancel.is_cancelled(),
            timings,
            fingerprint: store.fingerprint(),
        };
        log::info!(
            "Build finished: {} senses, {} relations ({} unmatched, {} ambiguous) in {} ms",
            report.senses,
            report.relations,
            report.resolve.unmatched,
            report.resolve.ambiguous,
            report.timings.total_ms
        );

        Ok(BuildOutput {
            store,
            forms,
            index,
            report,
        })
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
