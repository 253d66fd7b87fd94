use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunpeakError {
    #[error("Database not found: {}", .0.display())]
    StoreNotFound(PathBuf),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RunpeakError>;
