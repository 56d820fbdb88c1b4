//! Console errors and their HTTP mapping
//!
//! Every handler error renders as `{"error": "<message>"}`. Kubernetes
//! answers keep their status where it means something to the caller
//! (401, 403, 404, 409, 422); other upstream failures become 502.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cluster_client::ClusterError;
use provisioner::ProvisionError;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Cluster(#[from] ClusterError),

    /// Provisioning workflow error
    #[error(transparent)]
    Provision(#[from] ProvisionError),

    /// No usable bearer token on the request
    #[error("Missing or malformed bearer token")]
    Unauthorized,

    /// Malformed request body
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Startup or runtime configuration problem
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Identity provider unreachable or misbehaving
    #[error("OIDC error: {0}")]
    Oidc(String),

    /// Metrics could not be encoded
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Status to answer with for a Kubernetes error
fn cluster_status(err: &ClusterError) -> StatusCode {
    match err.status() {
        Some(code @ (401 | 403 | 404 | 409 | 422)) => {
            StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_GATEWAY)
        }
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl ConsoleError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Cluster(e) | Self::Provision(ProvisionError::Cluster(e)) => cluster_status(e),
            Self::Provision(ProvisionError::NetBox(_)) => StatusCode::BAD_GATEWAY,
            Self::Provision(ProvisionError::Configuration(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Provision(ProvisionError::ExhaustedPool { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Provision(ProvisionError::Validation(_)) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidConfig(_) | Self::Metrics(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Oidc(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Message shown to the caller
    fn message(&self) -> String {
        match self {
            Self::Cluster(e) | Self::Provision(ProvisionError::Cluster(e)) => e.message(),
            Self::Provision(ProvisionError::Validation(msg)) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ConsoleError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed ({}): {}", status, self);
        } else {
            warn!("Request rejected ({}): {}", status, self);
        }

        (status, Json(serde_json::json!({ "error": self.message() }))).into_response()
    }
}
