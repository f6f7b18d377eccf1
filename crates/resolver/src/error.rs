use thiserror::Error;

pub type Result<T> = std::result::Result<T, ResolverError>;

#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("Index covers {index_docs} documents but the sense table holds {senses} senses")]
    IndexMismatch { index_docs: usize, senses: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
