//! Error types for verse ingestion
//!
//! Per-verse and per-surah faults are recovered where they happen and never
//! reach this type. What remains here either ends a run (`AuthFailure`,
//! `MaxRetriesExceeded`) or comes from the surrounding plumbing.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum IngestError {
    /// The identity provider refused to issue a new access token
    #[error("Authentication failed: {0}")]
    AuthFailure(String),

    /// The top-level retry budget was spent on non-auth failures
    #[error("Giving up after {attempts} attempts; last error: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },

    /// A checkpoint or artifact file exists but does not decode
    #[error("Data file {} is corrupt: {source}", path.display())]
    StoreCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid verse key '{0}': expected '<surah>:<verse>' with both parts >= 1")]
    InvalidVerseKey(String),

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("Shard count must be at least 1, got {0}")]
    InvalidShardCount(usize),
}

impl IngestError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_catalog(msg: impl Into<String>) -> Self {
        Self::InvalidCatalog(msg.into())
    }
}

impl From<ayat_common::AyatError> for IngestError {
    fn from(err: ayat_common::AyatError) -> Self {
        use ayat_common::AyatError;

        match err {
            AyatError::Io(e) => IngestError::Io(e),
            AyatError::Serialization(e) => IngestError::Serialization(e),
            AyatError::Parse { path, source } => IngestError::StoreCorrupt { path, source },
            AyatError::Config(msg) => IngestError::Config(msg),
        }
    }
}
