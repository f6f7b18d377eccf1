use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Sense at position {position} has id {id}; ids must be contiguous from 0")]
    NonContiguous { position: usize, id: u32 },

    #[error("Too many {0} for a 32-bit index")]
    CapacityExceeded(&'static str),

    #[error("Invalid BM25 parameters: {0}")]
    InvalidParams(String),
}
