use std::path::PathBuf;

use testimony_core::error::CoreError;

/// Errors raised by the clip store and its repositories.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Reading or writing the store file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store file is not a valid clip document array.
    #[error("Invalid clip store JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A domain-level error (missing clip, bad input, conflicting state).
    #[error(transparent)]
    Core(#[from] CoreError),
}
