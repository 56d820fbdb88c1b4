//! Namespace and event listings

use crate::error::ConsoleError;
use crate::extract::BearerToken;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use cluster_client::{sort_events_newest_first, ListParams};
use k8s_openapi::api::core::v1::Event;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use serde::Serialize;

/// Names of the namespaces the console works in, as the API server returns them
pub(super) async fn list_namespaces(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<Vec<String>>, ConsoleError> {
    let cluster = state.cluster_for(&token)?;
    let params = ListParams::default().labels(&state.config.namespace_selector);

    let names = cluster
        .list_namespaces(&params)
        .await?
        .into_iter()
        .filter_map(|ns| ns.metadata.name)
        .collect();

    Ok(Json(names))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct EventSummary {
    name: String,
    last_seen: Option<Time>,
    #[serde(rename = "type")]
    type_: Option<String>,
    reason: Option<String>,
    /// "<Kind> <name>" of the involved object
    object: String,
    message: Option<String>,
    count: Option<i32>,
}

impl From<Event> for EventSummary {
    fn from(event: Event) -> Self {
        let involved = event.involved_object;
        let object = format!(
            "{} {}",
            involved.kind.unwrap_or_default(),
            involved.name.unwrap_or_default()
        );

        Self {
            name: event.metadata.name.unwrap_or_default(),
            last_seen: event.last_timestamp.or(event.metadata.creation_timestamp),
            type_: event.type_,
            reason: event.reason,
            object: object.trim().to_string(),
            message: event.message,
            count: event.count,
        }
    }
}

/// Events in `ns`, newest first
pub(super) async fn list_events(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path(ns): Path<String>,
) -> Result<Json<Vec<EventSummary>>, ConsoleError> {
    let cluster = state.cluster_for(&token)?;

    let mut events = cluster.list_events(&ns, &ListParams::default()).await?;
    sort_events_newest_first(&mut events);

    Ok(Json(events.into_iter().map(EventSummary::from).collect()))
}
