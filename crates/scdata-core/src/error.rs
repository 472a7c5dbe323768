//! Error types for scdata-core

use thiserror::Error;

/// Result type alias using scdata-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in scdata-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// `SQLite` error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input, including unparsable values read back from a row
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A caller broke an ordering contract, e.g. commented on a local note
    /// before creating it. Signals a bug, not a runtime condition.
    #[error("Invariant violated: {0}")]
    Invariant(String),
}
