//! CMS access error types.

use thiserror::Error;

/// Result type for CMS operations.
pub type CmsResult<T> = Result<T, CmsError>;

/// Errors that can occur while reading from the CMS.
#[derive(Debug, Error)]
pub enum CmsError {
    /// The CMS answered with an `error_code`.
    #[error("CMS API error: {message}")]
    Api { code: Option<i64>, message: String },

    /// An expected entry was absent from the response, or a reference
    /// pointer did not name one.
    #[error("entry not found: {content_type}/{uid}")]
    EntryNotFound { content_type: String, uid: String },

    /// A content type, asset or global field wrapper was absent.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CmsError {
    pub fn entry_not_found(content_type: &str, uid: &str) -> Self {
        CmsError::EntryNotFound {
            content_type: content_type.to_string(),
            uid: uid.to_string(),
        }
    }

    /// Returns true if this error means the requested entry does not exist.
    pub fn is_entry_not_found(&self) -> bool {
        matches!(self, CmsError::EntryNotFound { .. })
    }

    /// Returns true if the CMS rejected the request with an error code.
    pub fn is_api_error(&self) -> bool {
        matches!(self, CmsError::Api { .. })
    }
}
