//! ClusterClient trait for mocking
//!
//! Abstracts the Kubernetes client so request handlers and the provisioning
//! workflow can be exercised against an in-memory store.

use crate::error::ClusterError;
use crate::params::ListParams;
use crds::{VirtualMachine, VirtualMachineClusterInstancetype};
use k8s_openapi::api::core::v1::{Event, Namespace, PersistentVolumeClaim};

/// Trait for Kubernetes API client operations
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait ClusterClientTrait: Send + Sync {
    /// Get the API server base URL
    fn base_url(&self) -> &str;

    // Core resources
    async fn list_namespaces(&self, params: &ListParams) -> Result<Vec<Namespace>, ClusterError>;
    async fn list_events(&self, namespace: &str, params: &ListParams) -> Result<Vec<Event>, ClusterError>;
    async fn list_persistent_volume_claims(&self, namespace: &str, params: &ListParams) -> Result<Vec<PersistentVolumeClaim>, ClusterError>;

    // KubeVirt resources
    async fn list_virtual_machines(&self, namespace: &str, params: &ListParams) -> Result<Vec<VirtualMachine>, ClusterError>;
    async fn get_virtual_machine(&self, namespace: &str, name: &str) -> Result<VirtualMachine, ClusterError>;
    async fn create_virtual_machine(&self, namespace: &str, vm: &VirtualMachine) -> Result<VirtualMachine, ClusterError>;
    async fn list_compute_classes(&self, params: &ListParams) -> Result<Vec<VirtualMachineClusterInstancetype>, ClusterError>;
}
