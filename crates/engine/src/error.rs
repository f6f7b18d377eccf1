use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid build configuration: {0}")]
    Config(String),

    #[error("Lexicon error: {0}")]
    Lexicon(#[from] wordsense_lexicon::LexiconError),

    #[error("Sense store error: {0}")]
    Store(#[from] wordsense_store::StoreError),

    #[error("Normalizer error: {0}")]
    Normalizer(wordsense_normalizer::NormalizerError),

    #[error("Index build failed: {0}")]
    Index(#[from] wordsense_index::IndexError),

    #[error("Resolver error: {0}")]
    Resolver(#[from] wordsense_resolver::ResolverError),

    #[error("Failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Relation writer thread panicked")]
    WriterPanicked,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

// Store invariant violations surface as store errors whichever stage hit them
impl From<wordsense_normalizer::NormalizerError> for EngineError {
    fn from(err: wordsense_normalizer::NormalizerError) -> Self {
        match err {
            wordsense_normalizer::NormalizerError::Store(inner) => Self::Store(inner),
            other => Self::Normalizer(other),
        }
    }
}
