use thiserror::Error;

/// Result type for record construction and boundary reads
pub type Result<T> = std::result::Result<T, LexiconError>;

/// Errors raised while building or reading lexicon records
#[derive(Error, Debug)]
pub enum LexiconError {
    /// A record names no word
    #[error("Empty {field}")]
    EmptyWord { field: &'static str },

    /// A JSONL line failed to parse or validate
    #[error("Malformed record at line {line}: {message}")]
    Malformed { line: usize, message: String },

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LexiconError {
    /// Create an empty-word error for the named field
    pub const fn empty(field: &'static str) -> Self {
        Self::EmptyWord { field }
    }
}
