//! Error types for the staking node

use thiserror::Error;

/// Result type for node operations
pub type Result<T> = std::result::Result<T, Error>;

/// Node errors
#[derive(Error, Debug)]
pub enum Error {
    /// Staking state transition rejected
    #[error("Staking error: {0}")]
    Staking(#[from] dpos_core::Error),

    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Malformed replay input
    #[error("Invalid input at line {line}: {message}")]
    InvalidInput {
        /// 1-based line number
        line: usize,
        /// Parser message
        message: String,
    },

    /// Persisted snapshot does not decode
    #[error("Corrupted snapshot: {0}")]
    Corrupted(String),

    /// Metrics registration error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
