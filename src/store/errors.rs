//! Record store errors.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Record store error variants.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the collection file failed.
    #[error("failed to access {}", path.display())]
    Io {
        /// Collection file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The collection file exists but is not valid JSON for its schema.
    #[error("failed to parse {}", path.display())]
    Parse {
        /// Collection file.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The collection lock could not be acquired.
    #[error("failed to lock {}", path.display())]
    Lock {
        /// Lock file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The in-memory document could not be encoded.
    #[error("failed to encode document")]
    Encode(#[source] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
