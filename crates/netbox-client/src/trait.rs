//! NetBox operations behind a trait
//!
//! Provisioning depends on this trait, so the reservation workflow runs
//! against `MockNetBoxClient` in tests and `NetBoxClient` in production.

use crate::error::NetBoxError;
use crate::models::*;

/// NetBox IPAM operations used by provisioning
///
/// Futures are `Send` so callers can run on the multi-threaded runtime.
#[async_trait::async_trait]
pub trait NetBoxClientTrait: Send + Sync {
    fn base_url(&self) -> &str;

    async fn validate_token(&self) -> Result<(), NetBoxError>;

    async fn get_prefix(&self, id: u64) -> Result<Prefix, NetBoxError>;
    async fn query_prefixes(&self, filters: &[(&str, &str)], fetch_all: bool) -> Result<Vec<Prefix>, NetBoxError>;
    async fn get_available_ips(&self, prefix_id: u64, limit: Option<u32>) -> Result<Vec<AvailableIP>, NetBoxError>;
    async fn create_ip_address(&self, request: &IPAddressRequest) -> Result<IPAddress, NetBoxError>;
}

/// Shared clients (e.g. `Arc<dyn NetBoxClientTrait>`) delegate to the inner client.
#[async_trait::async_trait]
impl<T: NetBoxClientTrait + ?Sized> NetBoxClientTrait for std::sync::Arc<T> {
    fn base_url(&self) -> &str {
        (**self).base_url()
    }

    async fn validate_token(&self) -> Result<(), NetBoxError> {
        (**self).validate_token().await
    }

    async fn get_prefix(&self, id: u64) -> Result<Prefix, NetBoxError> {
        (**self).get_prefix(id).await
    }

    async fn query_prefixes(&self, filters: &[(&str, &str)], fetch_all: bool) -> Result<Vec<Prefix>, NetBoxError> {
        (**self).query_prefixes(filters, fetch_all).await
    }

    async fn get_available_ips(&self, prefix_id: u64, limit: Option<u32>) -> Result<Vec<AvailableIP>, NetBoxError> {
        (**self).get_available_ips(prefix_id, limit).await
    }

    async fn create_ip_address(&self, request: &IPAddressRequest) -> Result<IPAddress, NetBoxError> {
        (**self).create_ip_address(request).await
    }
}
