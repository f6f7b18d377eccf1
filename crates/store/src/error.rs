use thiserror::Error;
use wordsense_lexicon::SenseId;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Duplicate sense ('{word}', '{definition}') already stored as {existing}")]
    DuplicateSense {
        word: String,
        definition: String,
        existing: SenseId,
    },

    #[error("Unknown sense id {0}")]
    UnknownSense(SenseId),

    #[error("Sense {sense} belongs to '{actual}', relation targets '{expected}'")]
    WordMismatch {
        sense: SenseId,
        expected: String,
        actual: String,
    },

    #[error("Too many {0} for 32-bit ids")]
    CapacityExceeded(&'static str),

    #[error("Corrupt snapshot: {0}")]
    Corrupt(String),

    #[error("Unsupported snapshot schema_version {found} (expected {expected})")]
    UnsupportedSchema { found: u32, expected: u32 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
