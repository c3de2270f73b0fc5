//! Errors raised at the content API boundary

use thiserror::Error;

/// Failures fetching or validating content
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Content API returned {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("Failed to decode content API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid document {uid:?}: {reason}")]
    InvalidDocument { uid: Option<String>, reason: String },

    #[error("Document not found: {uid}")]
    NotFound { uid: String },

    #[error("Cursor does not belong to the configured API: {0}")]
    InvalidCursor(String),

    #[error("Invalid API endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Content API did not advertise a master ref")]
    MissingMasterRef,
}

impl ContentError {
    /// Shorthand for a schema violation
    pub fn invalid(uid: Option<&str>, reason: impl Into<String>) -> Self {
        ContentError::InvalidDocument {
            uid: uid.map(str::to_string),
            reason: reason.into(),
        }
    }

    /// Whether the document is known to be absent upstream
    pub fn is_not_found(&self) -> bool {
        matches!(self, ContentError::NotFound { .. })
    }
}
