//! Error types shared across Ayat crates

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for shared Ayat operations
pub type Result<T> = std::result::Result<T, AyatError>;

/// Main error type for shared Ayat helpers
#[derive(Error, Debug)]
pub enum AyatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Malformed JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AyatError {
    /// True when the error came from decoding a file's contents rather than
    /// from reaching the file.
    pub fn is_parse(&self) -> bool {
        matches!(self, AyatError::Parse { .. })
    }
}
