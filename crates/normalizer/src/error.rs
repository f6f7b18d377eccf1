use thiserror::Error;

pub type Result<T> = std::result::Result<T, NormalizerError>;

#[derive(Error, Debug)]
pub enum NormalizerError {
    /// The store refused a pair the dedup pass let through
    #[error("Sense store invariant violated: {0}")]
    Store(#[from] wordsense_store::StoreError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
