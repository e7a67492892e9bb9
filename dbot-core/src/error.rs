use memory_core::MemoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbotError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),
}

pub type Result<T> = std::result::Result<T, DbotError>;
