//! Error types raised by the on-device fallback store.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Convenient result alias returning [`LocalStoreError`] failures.
pub type LocalResult<T> = Result<T, LocalStoreError>;

/// Failures of the local JSON file backing the fallback store.
#[derive(Debug, Error)]
pub enum LocalStoreError {
    /// Reading, writing or renaming the store file failed (quota, permissions, ...).
    #[error("local store I/O failed for `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The in-memory records could not be encoded.
    #[error("failed to encode local store records")]
    Encode {
        #[source]
        source: serde_json::Error,
    },
    /// The store file exists but does not contain valid records.
    #[error("failed to decode local store file `{}`", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
