//! Provisioning errors

use cluster_client::ClusterError;
use netbox_client::NetBoxError;
use thiserror::Error;

/// Errors that can occur while provisioning a machine
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Kubernetes API error, passed through unchanged
    #[error("Kubernetes error: {0}")]
    Cluster(#[from] ClusterError),

    /// NetBox API error
    #[error("NetBox error: {0}")]
    NetBox(#[from] NetBoxError),

    /// NetBox data does not support provisioning (no unique pool prefix,
    /// prefix without gateway)
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The pool prefix has no free addresses left
    #[error("No available IPs in prefix {prefix_id}")]
    ExhaustedPool {
        /// NetBox prefix ID
        prefix_id: u64,
    },

    /// The submitted form is incomplete or malformed
    #[error("Invalid request: {0}")]
    Validation(String),
}
