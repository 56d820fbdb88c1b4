//! Shared request state

use crate::config::ConsoleConfig;
use crate::metrics::Metrics;
use crate::oidc::OidcProvider;
use cluster_client::{ClusterClient, ClusterClientTrait, ClusterError};
use netbox_client::NetBoxClientTrait;
use provisioner::Provisioner;
use std::sync::Arc;

/// Hands out a Kubernetes client acting as one caller
pub trait ClusterConnector: Send + Sync {
    fn connect(&self, token: &str) -> Result<Arc<dyn ClusterClientTrait>, ClusterError>;
}

/// Connects to the API server over one shared HTTP client
#[derive(Debug, Clone)]
pub struct HttpClusterConnector {
    http: reqwest::Client,
    base_url: String,
}

impl HttpClusterConnector {
    pub fn new(http: reqwest::Client, base_url: String) -> Self {
        Self { http, base_url }
    }
}

impl ClusterConnector for HttpClusterConnector {
    fn connect(&self, token: &str) -> Result<Arc<dyn ClusterClientTrait>, ClusterError> {
        let client = ClusterClient::with_http_client(self.http.clone(), self.base_url.clone(), token.to_string())?;
        Ok(Arc::new(client))
    }
}

pub type SharedProvisioner = Provisioner<Arc<dyn NetBoxClientTrait>>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ConsoleConfig>,
    pub cluster: Arc<dyn ClusterConnector>,
    pub provisioner: Arc<SharedProvisioner>,
    pub oidc: Arc<OidcProvider>,
    pub metrics: Arc<Metrics>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("kube_url", &self.config.kube_url)
            .field("provisioner", &self.provisioner)
            .field("oidc", &self.oidc.config().issuer)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Kubernetes client for the caller holding `token`
    pub fn cluster_for(&self, token: &str) -> Result<Arc<dyn ClusterClientTrait>, ClusterError> {
        self.cluster.connect(token)
    }
}
