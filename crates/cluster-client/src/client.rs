//! Kubernetes API client
//!
//! Plain REST calls against the API server. Paths come from
//! `kube::Resource::url_path` with caller-supplied segments percent-encoded;
//! bodies are k8s-openapi and `crds` types.

use crate::cluster_trait::ClusterClientTrait;
use crate::error::ClusterError;
use crate::params::{ListParams, ResourceList};
use crds::{VirtualMachine, VirtualMachineClusterInstancetype};
use k8s_openapi::api::core::v1::{Event, Namespace, PersistentVolumeClaim};
use kube::Resource;
use reqwest::{Certificate, Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Build the shared HTTP client, trusting `ca_pem` in addition to the
/// built-in roots when given.
///
/// The result is cheap to clone and should be reused across callers.
pub fn build_http_client(ca_pem: Option<&[u8]>) -> Result<Client, ClusterError> {
    let mut builder = Client::builder().timeout(Duration::from_secs(30));

    if let Some(pem) = ca_pem {
        let certs = Certificate::from_pem_bundle(pem)
            .map_err(|e| ClusterError::InvalidConfig(format!("invalid CA bundle: {}", e)))?;
        if certs.is_empty() {
            return Err(ClusterError::InvalidConfig("CA bundle contains no certificates".to_string()));
        }
        for cert in certs {
            builder = builder.add_root_certificate(cert);
        }
    }

    Ok(builder.build()?)
}

/// Kubernetes API client acting as a single caller
#[derive(Debug, Clone)]
pub struct ClusterClient {
    client: Client,
    base_url: String,
    token: String,
}

impl ClusterClient {
    /// Create a new client with its own HTTP client
    ///
    /// # Arguments
    /// * `base_url` - API server URL (e.g., "https://kubernetes.default.svc")
    /// * `token` - Bearer token of the caller
    /// * `ca_pem` - Optional PEM bundle for the API server certificate
    pub fn new(base_url: String, token: String, ca_pem: Option<&[u8]>) -> Result<Self, ClusterError> {
        let client = build_http_client(ca_pem)?;
        Self::with_http_client(client, base_url, token)
    }

    /// Create a client for one caller on top of a shared HTTP client
    pub fn with_http_client(client: Client, base_url: String, token: String) -> Result<Self, ClusterError> {
        if token.trim().is_empty() {
            return Err(ClusterError::InvalidConfig("bearer token is empty".to_string()));
        }

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Make a GET request
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClusterError> {
        let url = self.build_url(path);
        debug!("GET {}", url);

        let response = self.client
            .get(&url)
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json")
            .send()
            .await?;

        decode(response).await
    }

    /// Make a POST request
    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ClusterError> {
        let url = self.build_url(path);
        debug!("POST {}", url);

        let response = self.client
            .post(&url)
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await?;

        decode(response).await
    }

    /// List `K` in `namespace`, or cluster-wide for cluster-scoped kinds
    async fn list<K>(&self, namespace: Option<&str>, params: &ListParams) -> Result<Vec<K>, ClusterError>
    where
        K: Resource<DynamicType = ()> + DeserializeOwned,
    {
        let namespace = namespace.map(urlencoding::encode);
        let path = with_query(K::url_path(&(), namespace.as_deref()), params);
        let list: ResourceList<K> = self.get(&path).await?;
        Ok(list.items)
    }

    /// List namespaces, in server order
    pub async fn list_namespaces(&self, params: &ListParams) -> Result<Vec<Namespace>, ClusterError> {
        debug!("Listing namespaces with {:?}", params);
        self.list(None, params).await
    }

    /// List events of a namespace, in server order
    pub async fn list_events(&self, namespace: &str, params: &ListParams) -> Result<Vec<Event>, ClusterError> {
        debug!("Listing events in {}", namespace);
        self.list(Some(namespace), params).await
    }

    /// List persistent volume claims of a namespace
    pub async fn list_persistent_volume_claims(&self, namespace: &str, params: &ListParams) -> Result<Vec<PersistentVolumeClaim>, ClusterError> {
        debug!("Listing persistent volume claims in {} with {:?}", namespace, params);
        self.list(Some(namespace), params).await
    }

    /// List virtual machines of a namespace
    pub async fn list_virtual_machines(&self, namespace: &str, params: &ListParams) -> Result<Vec<VirtualMachine>, ClusterError> {
        debug!("Listing virtual machines in {}", namespace);
        self.list(Some(namespace), params).await
    }

    /// Get one virtual machine
    ///
    /// # Returns
    /// * `Err(ClusterError::Api { status: 404, .. })` - if it does not exist
    pub async fn get_virtual_machine(&self, namespace: &str, name: &str) -> Result<VirtualMachine, ClusterError> {
        debug!("Fetching virtual machine {}/{}", namespace, name);
        let namespace = urlencoding::encode(namespace);
        let path = format!(
            "{}/{}",
            VirtualMachine::url_path(&(), Some(&*namespace)),
            urlencoding::encode(name)
        );
        self.get(&path).await
    }

    /// Create a virtual machine
    ///
    /// The API server answers 409 when the name is taken and 422 when the
    /// manifest is invalid; both come back as `ClusterError::Api`.
    pub async fn create_virtual_machine(&self, namespace: &str, vm: &VirtualMachine) -> Result<VirtualMachine, ClusterError> {
        debug!("Creating virtual machine {}/{}", namespace, vm.metadata.name.as_deref().unwrap_or_default());
        let namespace = urlencoding::encode(namespace);
        let path = VirtualMachine::url_path(&(), Some(&*namespace));
        self.post(&path, vm).await
    }

    /// List cluster compute classes
    pub async fn list_compute_classes(&self, params: &ListParams) -> Result<Vec<VirtualMachineClusterInstancetype>, ClusterError> {
        debug!("Listing compute classes");
        self.list(None, params).await
    }
}

fn with_query(path: String, params: &ListParams) -> String {
    let query = params.to_query();
    if query.is_empty() {
        path
    } else {
        format!("{}?{}", path, query)
    }
}

/// Turn a response into `T`, or into `ClusterError::Api` for any non-2xx status.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClusterError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(ClusterError::Api {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        debug!(
            "error decoding response body: {} - Response (first 500 chars): {}",
            e,
            body.chars().take(500).collect::<String>()
        );
        ClusterError::Serialization(e)
    })
}

#[async_trait::async_trait]
impl ClusterClientTrait for ClusterClient {
    fn base_url(&self) -> &str {
        self.base_url()
    }

    async fn list_namespaces(&self, params: &ListParams) -> Result<Vec<Namespace>, ClusterError> {
        self.list_namespaces(params).await
    }

    async fn list_events(&self, namespace: &str, params: &ListParams) -> Result<Vec<Event>, ClusterError> {
        self.list_events(namespace, params).await
    }

    async fn list_persistent_volume_claims(&self, namespace: &str, params: &ListParams) -> Result<Vec<PersistentVolumeClaim>, ClusterError> {
        self.list_persistent_volume_claims(namespace, params).await
    }

    async fn list_virtual_machines(&self, namespace: &str, params: &ListParams) -> Result<Vec<VirtualMachine>, ClusterError> {
        self.list_virtual_machines(namespace, params).await
    }

    async fn get_virtual_machine(&self, namespace: &str, name: &str) -> Result<VirtualMachine, ClusterError> {
        self.get_virtual_machine(namespace, name).await
    }

    async fn create_virtual_machine(&self, namespace: &str, vm: &VirtualMachine) -> Result<VirtualMachine, ClusterError> {
        self.create_virtual_machine(namespace, vm).await
    }

    async fn list_compute_classes(&self, params: &ListParams) -> Result<Vec<VirtualMachineClusterInstancetype>, ClusterError> {
        self.list_compute_classes(params).await
    }
}
