use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Failure taxonomy shared by the loader, the store and every strategy.
///
/// Data-quality problems found while normalizing are not errors; they are
/// reported as [`crate::models::DataQualityIssue`]s next to a successful load.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Neither the spreadsheet nor the delimited source could be found or read.
    #[error("no usable source in {dir}: {reason}")]
    SourceUnavailable { dir: PathBuf, reason: String },

    /// A source file exists but could not be parsed completely.
    #[error("source {path} is corrupt: {reason}")]
    SourceCorrupt { path: PathBuf, reason: String },

    /// Malformed caller input. Never corrected on the caller's behalf.
    #[error("invalid request: {0}")]
    Validation(String),

    /// A normal empty result for an exact lookup.
    #[error("no record with case id {0}")]
    NotFound(String),
}

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        EngineError::Validation(msg.into())
    }

    pub fn corrupt(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        EngineError::SourceCorrupt {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// `true` for outcomes that callers should treat as an empty result
    /// rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::NotFound(_))
    }
}
