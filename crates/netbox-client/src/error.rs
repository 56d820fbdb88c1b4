//! NetBox client errors

use thiserror::Error;

/// Errors that can occur when interacting with the NetBox API
#[derive(Debug, Error)]
pub enum NetBoxError {
    /// HTTP request/response error (connection, TLS, timeout, body decoding)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// NetBox answered with a non-2xx status. The body is kept verbatim.
    #[error("NetBox API error: {status} - {body}")]
    Api {
        /// HTTP status code returned by NetBox
        status: u16,
        /// Raw response body
        body: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl NetBoxError {
    /// HTTP status carried by an API error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Serialization(_) => None,
        }
    }

    /// Whether NetBox refused the write because of data it already holds:
    /// 400 for a failed uniqueness check, 409 for a conflicting edit.
    /// Authorization failures and server faults are not conflicts.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Api { status: 400 | 409, .. })
    }
}
