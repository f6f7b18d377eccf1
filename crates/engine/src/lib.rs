//! # Wordsense Engine
//!
//! Drives one build end to end:
//!
//! ```text
//! Lexeme stream ──shards──> SenseNormalizer ──> SenseStore (senses frozen)
//!                                                   │
//!                                                   ├──> SenseIndex (BM25)
//!                                                   │
//! RelationRaw stream ──batches──> RelationResolver ─┴─> writer thread ──> relations
//! ```
//!
//! Configuration comes from [`BuildConfig`] (JSON or TOML). A [`CancelFlag`] stops the build
//! between shards or batches; whatever was committed up to that point stays consistent.

mod cancel;
mod config;
mod error;
mod observer;
mod pipeline;

pub use cancel::CancelFlag;
pub use config::{
    BuildConfig, IndexSettings, ResolverSettings, BUILD_CONFIG_SCHEMA_VERSION, WORKERS_ENV,
};
pub use error::{EngineError, Result};
pub use observer::{BuildObserver, NoopObserver, Phase};
pub use pipeline::{BuildOutput, BuildPipeline, BuildReport, PhaseTimings, ResolvePhase};
