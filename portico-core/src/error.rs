//! Error types for portico-core.

use std::path::PathBuf;

use thiserror::Error;

/// A definition file that could not be admitted to the collection.
#[derive(Debug, Error)]
#[error("invalid endpoint definition {path}: {reason}")]
pub struct ValidationError {
    pub path: PathBuf,
    pub reason: String,
}

impl ValidationError {
    pub fn new(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// All errors that can arise while loading the backends directory.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A definition failed to parse or violated a constraint.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}
