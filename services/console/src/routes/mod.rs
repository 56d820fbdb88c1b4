//! HTTP routes
//!
//! - `/healthz`, `/readyz`, `/metrics` - Probes and metrics, no auth
//! - `/auth/config` - Public OIDC settings for the browser
//! - `/api/namespaces/...` - Cluster reads and machine creation as the caller
//!
//! Every `/api` route needs `Authorization: Bearer <token>`; the token is
//! passed through to the API server unchanged.

mod machines;
mod namespaces;


use crate::error::ConsoleError;
use crate::oidc::AuthSettings;
use crate::state::AppState;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/auth/config", get(auth_config))
        .route("/api/namespaces", get(namespaces::list_namespaces))
        .route("/api/namespaces/{ns}/events", get(namespaces::list_events))
        .route(
            "/api/namespaces/{ns}/machines",
            get(machines::list_machines).post(machines::create_machine),
        )
        .route("/api/namespaces/{ns}/machines/options", get(machines::machine_options))
        .route("/api/namespaces/{ns}/machines/{name}", get(machines::get_machine))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

/// Ready once the identity provider has been discovered. Each call retries
/// discovery until it succeeds.
async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    match state.oidc.metadata().await {
        Ok(_) => (StatusCode::OK, "ok"),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "identity provider not discovered"),
    }
}

async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, ConsoleError> {
    let body = state.metrics.gather()?;
    Ok(([(CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}

async fn auth_config(State(state): State<AppState>) -> Result<Json<AuthSettings>, ConsoleError> {
    Ok(Json(state.oidc.auth_settings().await?))
}
