//! Mock ClusterClient for unit testing
//!
//! In-memory stand-in for the API server. Errors come back shaped like the
//! API server's own `Status` answers so callers see realistic bodies.
//!
//! - `selector.rs` - Equality-based label selector matching

mod selector;

use crate::cluster_trait::ClusterClientTrait;
use crate::error::ClusterError;
use crate::params::ListParams;
use crds::{VirtualMachine, VirtualMachineClusterInstancetype};
use k8s_openapi::api::core::v1::{Event, Namespace, PersistentVolumeClaim};
use kube::Resource;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Mock ClusterClient for testing
#[derive(Debug, Clone)]
pub struct MockClusterClient {
    base_url: String,
    namespaces: Arc<Mutex<Vec<Namespace>>>,
    events: Arc<Mutex<BTreeMap<String, Vec<Event>>>>,
    pvcs: Arc<Mutex<BTreeMap<String, Vec<PersistentVolumeClaim>>>>,
    // Keyed by (namespace, name) so list order is stable
    vms: Arc<Mutex<BTreeMap<(String, String), VirtualMachine>>>,
    compute_classes: Arc<Mutex<Vec<VirtualMachineClusterInstancetype>>>,
    // Injected failure for the next create call
    create_failure: Arc<Mutex<Option<(u16, String)>>>,
    create_calls: Arc<Mutex<u32>>,
}

impl Default for MockClusterClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockClusterClient {
    /// Create an empty mock cluster
    pub fn new() -> Self {
        Self {
            base_url: "https://mock-apiserver".to_string(),
            namespaces: Arc::default(),
            events: Arc::default(),
            pvcs: Arc::default(),
            vms: Arc::default(),
            compute_classes: Arc::default(),
            create_failure: Arc::default(),
            create_calls: Arc::default(),
        }
    }

    /// Add a namespace (for test setup)
    pub fn add_namespace(&self, namespace: Namespace) {
        lock(&self.namespaces).push(namespace);
    }

    /// Add an event to the namespace in its metadata (for test setup)
    pub fn add_event(&self, event: Event) {
        let ns = event.metadata.namespace.clone().unwrap_or_default();
        lock(&self.events).entry(ns).or_default().push(event);
    }

    /// Add a persistent volume claim (for test setup)
    pub fn add_persistent_volume_claim(&self, pvc: PersistentVolumeClaim) {
        let ns = pvc.metadata.namespace.clone().unwrap_or_default();
        lock(&self.pvcs).entry(ns).or_default().push(pvc);
    }

    /// Add a virtual machine without going through create (for test setup)
    pub fn add_virtual_machine(&self, vm: VirtualMachine) {
        let key = (
            vm.metadata.namespace.clone().unwrap_or_default(),
            vm.metadata.name.clone().unwrap_or_default(),
        );
        lock(&self.vms).insert(key, vm);
    }

    /// Add a compute class (for test setup)
    pub fn add_compute_class(&self, class: VirtualMachineClusterInstancetype) {
        lock(&self.compute_classes).push(class);
    }

    /// Make the next create call fail with the given status and raw body
    pub fn fail_next_create(&self, status: u16, body: &str) {
        *lock(&self.create_failure) = Some((status, body.to_string()));
    }

    /// Number of create calls received, failed ones included
    pub fn create_calls(&self) -> u32 {
        *lock(&self.create_calls)
    }

    /// Stored virtual machines of a namespace
    pub fn virtual_machines(&self, namespace: &str) -> Vec<VirtualMachine> {
        lock(&self.vms)
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|(_, vm)| vm.clone())
            .collect()
    }
}

/// A poisoned lock only means another test thread panicked; the data is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Kubernetes `Status` body as the API server sends it
fn status_error(code: u16, reason: &str, message: String) -> ClusterError {
    let body = serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code,
    });
    ClusterError::Api {
        status: code,
        body: body.to_string(),
    }
}

/// Apply a list call's selector and limit
fn select<K: Resource + Clone>(items: &[K], params: &ListParams) -> Vec<K> {
    let mut selected: Vec<K> = items
        .iter()
        .filter(|item| {
            params
                .label_selector
                .as_deref()
                .is_none_or(|s| selector::matches(s, item.meta().labels.as_ref()))
        })
        .cloned()
        .collect();
    if let Some(limit) = params.limit {
        selected.truncate(limit as usize);
    }
    selected
}

#[async_trait::async_trait]
impl ClusterClientTrait for MockClusterClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn list_namespaces(&self, params: &ListParams) -> Result<Vec<Namespace>, ClusterError> {
        Ok(select(&lock(&self.namespaces), params))
    }

    async fn list_events(&self, namespace: &str, params: &ListParams) -> Result<Vec<Event>, ClusterError> {
        let events = lock(&self.events).get(namespace).cloned().unwrap_or_default();
        Ok(select(&events, params))
    }

    async fn list_persistent_volume_claims(&self, namespace: &str, params: &ListParams) -> Result<Vec<PersistentVolumeClaim>, ClusterError> {
        let pvcs = lock(&self.pvcs).get(namespace).cloned().unwrap_or_default();
        Ok(select(&pvcs, params))
    }

    async fn list_virtual_machines(&self, namespace: &str, params: &ListParams) -> Result<Vec<VirtualMachine>, ClusterError> {
        Ok(select(&self.virtual_machines(namespace), params))
    }

    async fn get_virtual_machine(&self, namespace: &str, name: &str) -> Result<VirtualMachine, ClusterError> {
        lock(&self.vms)
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| {
                status_error(
                    404,
                    "NotFound",
                    format!("virtualmachines.kubevirt.io \"{}\" not found", name),
                )
            })
    }

    async fn create_virtual_machine(&self, namespace: &str, vm: &VirtualMachine) -> Result<VirtualMachine, ClusterError> {
        *lock(&self.create_calls) += 1;

        if let Some((status, body)) = lock(&self.create_failure).take() {
            return Err(ClusterError::Api { status, body });
        }

        let name = vm.metadata.name.clone().unwrap_or_default();
        if name.is_empty() {
            return Err(status_error(
                422,
                "Invalid",
                "VirtualMachine.kubevirt.io \"\" is invalid: metadata.name: Required value".to_string(),
            ));
        }

        let mut vms = lock(&self.vms);
        let key = (namespace.to_string(), name.clone());
        if vms.contains_key(&key) {
            return Err(status_error(
                409,
                "AlreadyExists",
                format!("virtualmachines.kubevirt.io \"{}\" already exists", name),
            ));
        }

        let mut created = vm.clone();
        created.metadata.namespace = Some(namespace.to_string());
        vms.insert(key, created.clone());
        Ok(created)
    }

    async fn list_compute_classes(&self, params: &ListParams) -> Result<Vec<VirtualMachineClusterInstancetype>, ClusterError> {
        Ok(select(&lock(&self.compute_classes), params))
    }
}
