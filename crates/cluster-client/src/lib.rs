//! Kubernetes API client
//!
//! A thin, per-caller client for the handful of resources the machine
//! console reads and creates. Every request carries the caller's own bearer
//! token, so authorization stays with the API server.
//!
//! # Example
//!
//! ```no_run
//! use cluster_client::{ClusterClient, ListParams};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ClusterClient::new(
//!     "https://kubernetes.default.svc".to_string(),
//!     "user-token".to_string(),
//!     None,
//! )?;
//!
//! let params = ListParams::default().labels("monsoon.ianunruh.com/enabled=true");
//! for ns in client.list_namespaces(&params).await? {
//!     println!("{:?}", ns.metadata.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod params;
pub mod sort;
#[path = "trait.rs"]
pub mod cluster_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

#[cfg(test)]
mod client_test;

pub use client::{build_http_client, ClusterClient};
pub use cluster_trait::ClusterClientTrait;
pub use error::ClusterError;
pub use params::{ListParams, ResourceList};
pub use sort::{sort_compute_classes, sort_events_newest_first};
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockClusterClient;
