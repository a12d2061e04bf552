use std::path::PathBuf;

use thiserror::Error;

use crate::types::DocId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("No descriptors loaded from the corpus")]
    EmptyCorpus,

    #[error("No descriptors loaded from the query set")]
    EmptyQuerySet,

    #[error("Could not find the image file for the document {id}")]
    Consistency { id: DocId },

    #[error("Operation failed: {0}")]
    Operation(String),
}

impl Error {
    /// Attach the offending path to an I/O failure.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Parse { path: path.into(), reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
