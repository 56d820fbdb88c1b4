//! NetBox REST API Client
//!
//! A small client for the slice of the NetBox IPAM API that machine
//! provisioning needs: prefixes, their available addresses, and address
//! creation.
//!
//! # Example
//!
//! ```no_run
//! use netbox_client::{NetBoxClient, IPAddressRequest, IPAddressStatus};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = NetBoxClient::new(
//!     "http://netbox:80".to_string(),
//!     "your-api-token".to_string(),
//! )?;
//!
//! let prefixes = client.query_prefixes(&[], true).await?;
//! let available = client.get_available_ips(prefixes[0].id, None).await?;
//!
//! let request = IPAddressRequest {
//!     address: available[0].address.clone(),
//!     description: Some("default/web-1".to_string()),
//!     status: Some(IPAddressStatus::Active),
//!     dns_name: None,
//! };
//! let ip = client.create_ip_address(&request).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod common;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod netbox_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;


pub use client::NetBoxClient;
pub use common::{HttpClient, PaginatedResponse};
pub use error::NetBoxError;
pub use models::*;
pub use netbox_trait::NetBoxClientTrait;
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockNetBoxClient;
