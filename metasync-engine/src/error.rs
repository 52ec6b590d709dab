//! Engine error types.

use metasync_cms::CmsError;
use thiserror::Error;

/// Result type for transformation and merge operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that abort a transformation or merge.
///
/// There is no partial-result mode: the first failure anywhere in the
/// recursive traversal is returned to the caller.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Cms(#[from] CmsError),

    #[error("invalid date in field {field}: {value}")]
    InvalidDate { field: String, value: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Returns true if a required entry could not be fetched.
    pub fn is_entry_not_found(&self) -> bool {
        matches!(self, EngineError::Cms(e) if e.is_entry_not_found())
    }
}
