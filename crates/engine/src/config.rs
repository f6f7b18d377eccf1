use crate::error::{EngineError, Result};
use serde::Deserialize;
use std::path::Path;
use wordsense_index::Bm25Params;
use wordsense_normalizer::NormalizerConfig;
use wordsense_resolver::ResolverConfig;

pub const BUILD_CONFIG_SCHEMA_VERSION: u32 = 1;
pub const WORKERS_ENV: &str = "WORDSENSE_WORKERS";
const MAX_WORKERS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexSettings {
    pub params: Bm25Params,
    /// Documents per parallel postings shard
    pub shard_size: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            params: Bm25Params::default(),
            shard_size: 65_536,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverSettings {
    pub config: ResolverConfig,
    /// Relations per batch; one batch is one staged commit
    pub batch_size: usize,
    /// Resolved batches buffered ahead of the writer
    pub queue_depth: usize,
    pub max_relations: Option<usize>,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            config: ResolverConfig::default(),
            batch_size: 1024,
            queue_depth: 4,
            max_relations: None,
        }
    }
}

/// Settings for one build.
///
/// Loaded from JSON or TOML; every key is optional and falls back to its default. The worker
/// count comes from `WORDSENSE_WORKERS` when set, then the file, then the CPU count.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    pub workers: usize,
    pub normalizer: NormalizerConfig,
    pub index: IndexSettings,
    pub resolver: ResolverSettings,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            workers: workers_from_env(None),
            normalizer: NormalizerConfig::default(),
            index: IndexSettings::default(),
            resolver: ResolverSettings::default(),
        }
    }
}

impl BuildConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|err| {
            EngineError::Config(format!("Failed to read {}: {err}", path.display()))
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw = parse_raw(bytes)?;
        let config = Self::from_raw(raw, std::env::var(WORKERS_ENV).ok().as_deref())?;
        config.validate()?;
        Ok(config)
    }

    fn from_raw(raw: RawBuildConfig, env_workers: Option<&str>) -> Result<Self> {
        if let Some(found) = raw.schema_version {
            if found != BUILD_CONFIG_SCHEMA_VERSION {
                return Err(EngineError::Config(format!(
                    "Unsupported schema_version {found} (expected {BUILD_CONFIG_SCHEMA_VERSION})"
                )));
            }
        }

        let normalizer_defaults = NormalizerConfig::default();
        let normalizer = raw.normalizer.unwrap_or_default();
        let index_defaults = IndexSettings::default();
        let index = raw.index.unwrap_or_default();
        let resolver_defaults = ResolverSettings::default();
        let resolver = raw.resolver.unwrap_or_default();

        Ok(Self {
            workers: resolve_workers(raw.workers, env_workers),
            normalizer: NormalizerConfig {
                shard_size: normalizer
                    .shard_size
                    .unwrap_or(normalizer_defaults.shard_size),
                max_lexemes: normalizer.max_lexemes.or(normalizer_defaults.max_lexemes),
            },
            index: IndexSettings {
                params: Bm25Params {
                    k1: index.k1.unwrap_or(index_defaults.params.k1),
                    b: index.b.unwrap_or(index_defaults.params.b),
                },
                shard_size: index.shard_size.unwrap_or(index_defaults.shard_size),
            },
            resolver: ResolverSettings {
                config: ResolverConfig {
                    ambiguity_tolerance: resolver
                        .ambiguity_tolerance
                        .unwrap_or(resolver_defaults.config.ambiguity_tolerance),
                },
                batch_size: resolver.batch_size.unwrap_or(resolver_defaults.batch_size),
                queue_depth: resolver.queue_depth.unwrap_or(resolver_defaults.queue_depth),
                max_relations: resolver.max_relations.or(resolver_defaults.max_relations),
            },
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_WORKERS).contains(&self.workers) {
            return Err(EngineError::Config(format!(
                "workers must be within 1..={MAX_WORKERS}, got {}",
                self.workers
            )));
        }
        self.normalizer
            .validate()
            .map_err(|err| EngineError::Config(err.to_string()))?;
        self.index
            .params
            .validate()
            .map_err(|err| EngineError::Config(err.to_string()))?;
        self.resolver
            .config
            .validate()
            .map_err(|err| EngineError::Config(err.to_string()))?;
        for (key, value) in [
            ("index.shard_size", self.index.shard_size),
            ("resolver.batch_size", self.resolver.batch_size),
            ("resolver.queue_depth", self.resolver.queue_depth),
        ] {
            if value == 0 {
                return Err(EngineError::Config(format!("{key} must be > 0")));
            }
        }
        Ok(())
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, MAX_WORKERS)
}

fn parse_workers(raw: Option<&str>) -> Option<usize> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<usize>().ok())
        .map(|v| v.clamp(1, MAX_WORKERS))
}

fn resolve_workers(from_file: Option<usize>, env: Option<&str>) -> usize {
    parse_workers(env)
        .or_else(|| from_file.map(|v| v.clamp(1, MAX_WORKERS)))
        .unwrap_or_else(default_workers)
}

fn workers_from_env(from_file: Option<usize>) -> usize {
    let raw = std::env::var(WORKERS_ENV).ok();
    resolve_workers(from_file, raw.as_deref())
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBuildConfig {
    schema_version: Option<u32>,
    workers: Option<usize>,
    normalizer: Option<RawNormalizer>,
    index: Option<RawIndex>,
    resolver: Option<RawResolver>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawNormalizer {
    shard_size: Option<usize>,
    max_lexemes: Option<usize>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawIndex {
    k1: Option<f32>,
    b: Option<f32>,
    shard_size: Option<usize>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawResolver {
    ambiguity_tolerance: Option<f32>,
    batch_size: Option<usize>,
    queue_depth: Option<usize>,
    max_relations: Option<usize>,
}

fn parse_raw(bytes: &[u8]) -> Result<RawBuildConfig> {
    let value: serde_json::Value = match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(json_err) => {
            let utf8 = std::str::from_utf8(bytes)
                .map_err(|err| EngineError::Config(format!("{json_err}; {err}")))?;
            let toml_value: toml::Value = toml::from_str(utf8).map_err(|toml_err| {
                EngineError::Config(format!(
                    "Config is not valid JSON or TOML ({json_err}); TOML parse error: {toml_err}"
                ))
            })?;
            serde_json::to_value(toml_value).map_err(|err| {
                EngineError::Config(format!("Failed to convert TOML config to JSON: {err}"))
            })?
        }
    };
    serde_json::from_value(value).map_err(|err| EngineError::Config(format!("Config parse error: {err}")))
}
