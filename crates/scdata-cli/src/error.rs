use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] scdata_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid bounding box '{0}': expected MIN_LAT,MIN_LON,MAX_LAT,MAX_LON")]
    InvalidBoundingBox(String),
    #[error("Note text cannot be empty")]
    EmptyText,
    #[error("Edit not found: {0}")]
    EditNotFound(i64),
    #[error("Edit {0} is already uploaded")]
    EditAlreadySynced(i64),
    #[error("Note not found: {0}")]
    NoteNotFound(i64),
    #[error("No geometry stored for {0}")]
    GeometryNotFound(String),
    #[error("Configuration error: {0}")]
    Config(String),
}
