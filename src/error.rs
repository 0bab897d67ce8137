//! Error handling module
//!
//! Provides unified error types for the catalog, the store and the commands.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to {operation} {context}: {source}")]
    Serialization {
        context: String,
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("no previous snapshot found for project '{0}'")]
    NoPreviousSnapshot(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

impl AppError {
    /// True when the error means "nothing stored here yet"
    pub fn is_not_found(&self) -> bool {
        match self {
            AppError::NotFound(_) | AppError::NoPreviousSnapshot(_) => true,
            AppError::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Result type alias used throughout the crate
pub type AppResult<T> = Result<T, AppError>;

/// Helper function to wrap an I/O error with the path it happened on
pub fn io_error(path: impl AsRef<Path>, source: std::io::Error) -> AppError {
    AppError::Io {
        path: path.as_ref().to_path_buf(),
        source,
    }
}

/// Helper function to create a serialization error for a project's snapshot
pub fn snapshot_serialization_error(
    project: &str,
    operation: &'static str,
    source: serde_json::Error,
) -> AppError {
    AppError::Serialization {
        context: format!("snapshot for project '{}'", project),
        operation,
        source,
    }
}

/// Helper function to create a not found error
pub fn not_found_error(msg: impl Into<String>) -> AppError {
    AppError::NotFound(msg.into())
}
