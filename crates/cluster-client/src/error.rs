//! Cluster client errors

use thiserror::Error;

/// Errors that can occur when talking to the Kubernetes API server
#[derive(Debug, Error)]
pub enum ClusterError {
    /// HTTP request/response error (connection, TLS, timeout, body decoding)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API server answered with a non-2xx status. The body is kept
    /// verbatim, usually a `Status` object.
    #[error("Kubernetes API error: {status} - {body}")]
    Api {
        /// HTTP status code returned by the API server
        status: u16,
        /// Raw response body
        body: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Client could not be built from the given settings
    #[error("Invalid cluster client configuration: {0}")]
    InvalidConfig(String),
}

impl ClusterError {
    /// HTTP status carried by an API error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Serialization(_) | Self::InvalidConfig(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }

    /// 422, the API server's answer to a manifest that fails validation
    pub fn is_invalid(&self) -> bool {
        self.status() == Some(422)
    }

    /// Human readable message from a Kubernetes `Status` body, falling back
    /// to the raw body or the error itself.
    pub fn message(&self) -> String {
        if let Self::Api { body, .. } = self {
            let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
            if let Some(msg) = parsed
                .as_ref()
                .and_then(|v| v.get("message"))
                .and_then(|m| m.as_str())
            {
                return msg.to_string();
            }
            if !body.is_empty() {
                return body.clone();
            }
        }
        self.to_string()
    }
}
