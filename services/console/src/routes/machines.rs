//! Machine listing, detail, form options and creation

use crate::error::ConsoleError;
use crate::extract::{BearerToken, MachineFormBody};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::header::LOCATION;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use cluster_client::{sort_compute_classes, ListParams};
use crds::VirtualMachine;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct MachineSummary {
    name: String,
    ipv4_address: Option<String>,
    status: String,
    created: Option<Time>,
}

impl From<&VirtualMachine> for MachineSummary {
    fn from(vm: &VirtualMachine) -> Self {
        Self {
            name: vm.metadata.name.clone().unwrap_or_default(),
            ipv4_address: vm.ipv4_address().map(ToString::to_string),
            status: vm.printable_status().to_string(),
            created: vm.metadata.creation_timestamp.clone(),
        }
    }
}

pub(super) async fn list_machines(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path(ns): Path<String>,
) -> Result<Json<Vec<MachineSummary>>, ConsoleError> {
    let cluster = state.cluster_for(&token)?;
    let machines = cluster.list_virtual_machines(&ns, &ListParams::default()).await?;

    Ok(Json(machines.iter().map(MachineSummary::from).collect()))
}

pub(super) async fn get_machine(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path((ns, name)): Path<(String, String)>,
) -> Result<Json<VirtualMachine>, ConsoleError> {
    let cluster = state.cluster_for(&token)?;
    Ok(Json(cluster.get_virtual_machine(&ns, &name).await?))
}

#[derive(Debug, Serialize)]
pub(super) struct ImageOption {
    name: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ComputeClassOption {
    name: String,
    cpu: Option<u32>,
    /// GiB
    memory: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct MachineOptions {
    images: Vec<ImageOption>,
    compute_classes: Vec<ComputeClassOption>,
}

/// Choices for the new machine form: source images and compute classes
pub(super) async fn machine_options(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path(_ns): Path<String>,
) -> Result<Json<MachineOptions>, ConsoleError> {
    let cluster = state.cluster_for(&token)?;
    let image_params = ListParams::default().labels(&state.config.image_selector);
    let class_params = ListParams::default();

    let (images, mut classes) = tokio::try_join!(
        cluster.list_persistent_volume_claims(&state.config.image_namespace, &image_params),
        cluster.list_compute_classes(&class_params),
    )?;
    sort_compute_classes(&mut classes);

    Ok(Json(MachineOptions {
        images: images
            .into_iter()
            .filter_map(|pvc| pvc.metadata.name)
            .map(|name| ImageOption { name })
            .collect(),
        compute_classes: classes
            .iter()
            .map(|class| ComputeClassOption {
                name: class.metadata.name.clone().unwrap_or_default(),
                cpu: class.cpu_label(),
                memory: class.memory_gib_label(),
            })
            .collect(),
    }))
}

/// Validate the form, reserve an address and create the machine
pub(super) async fn create_machine(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path(ns): Path<String>,
    MachineFormBody(form): MachineFormBody,
) -> Result<impl IntoResponse, ConsoleError> {
    let request = form.validate()?;
    let cluster = state.cluster_for(&token)?;

    let vm = state.provisioner.create_machine(cluster.as_ref(), &ns, &request).await?;
    info!("Machine {}/{} submitted", ns, request.name);

    let location = format!("/api/namespaces/{}/machines/{}", ns, request.name);
    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(vm)))
}
