//! In-memory NetBoxClient for unit tests
//!
//! - `ipam.rs` - IPAM operations (prefixes, available IPs, IP addresses)
//! - `helpers.rs` - Builders for test fixtures

mod helpers;
mod ipam;

pub use helpers::{available_ip, prefix};

use crate::error::NetBoxError;
use crate::models::*;
use crate::netbox_trait::NetBoxClientTrait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Mock NetBoxClient for testing
///
/// Stores prefixes, available IPs and created addresses in memory. Creating
/// an address removes it from every available list, and creating an address
/// that already exists fails with a 400 the way NetBox does when global
/// uniqueness is enforced.
#[derive(Debug, Clone)]
pub struct MockNetBoxClient {
    pub(crate) base_url: String,
    // Keyed by ID so list order is stable
    pub(crate) prefixes: Arc<Mutex<BTreeMap<u64, Prefix>>>,
    pub(crate) ip_addresses: Arc<Mutex<BTreeMap<u64, IPAddress>>>,
    pub(crate) available_ips: Arc<Mutex<BTreeMap<u64, Vec<AvailableIP>>>>,
    // Call journal for assertions
    pub(crate) create_requests: Arc<Mutex<Vec<IPAddressRequest>>>,
    pub(crate) available_ip_queries: Arc<Mutex<u32>>,
    pub(crate) next_id: Arc<Mutex<u64>>,
    // Status every create answers with, for tokens without write permission
    pub(crate) denied_writes: Arc<Mutex<Option<u16>>>,
}

impl MockNetBoxClient {
    /// Create a new mock client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            prefixes: Arc::default(),
            ip_addresses: Arc::default(),
            available_ips: Arc::default(),
            create_requests: Arc::default(),
            available_ip_queries: Arc::default(),
            next_id: Arc::new(Mutex::new(1)),
            denied_writes: Arc::default(),
        }
    }

    /// Add a prefix to the mock store (for test setup)
    pub fn add_prefix(&self, prefix: Prefix) {
        lock(&self.prefixes).insert(prefix.id, prefix);
    }

    /// Set the available IPs for a prefix (for test setup)
    pub fn set_available_ips(&self, prefix_id: u64, ips: Vec<AvailableIP>) {
        lock(&self.available_ips).insert(prefix_id, ips);
    }

    /// Record an address as assigned without removing it from the available
    /// lists, as if another caller had claimed it between our list and create.
    /// The next create of that address fails and drops it from the lists.
    pub fn claim_behind_back(&self, address: &str) {
        let id = self.next_id();
        let ip = helpers::ip_address(id, address, "claimed elsewhere");
        lock(&self.ip_addresses).insert(id, ip);
    }

    /// Refuse every create with `status` (401 or 403), as NetBox does for a
    /// token that may read but not write.
    pub fn deny_writes(&self, status: u16) {
        *lock(&self.denied_writes) = Some(status);
    }

    /// Every create request received, in order
    pub fn create_requests(&self) -> Vec<IPAddressRequest> {
        lock(&self.create_requests).clone()
    }

    /// Number of available-IPs queries served
    pub fn available_ip_queries(&self) -> u32 {
        *lock(&self.available_ip_queries)
    }

    /// Addresses currently assigned
    pub fn assigned_addresses(&self) -> Vec<IPAddress> {
        lock(&self.ip_addresses).values().cloned().collect()
    }

    pub(crate) fn next_id(&self) -> u64 {
        let mut id = lock(&self.next_id);
        let current = *id;
        *id += 1;
        current
    }
}

/// A poisoned lock only means another test thread panicked; the data is still usable.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait::async_trait]
impl NetBoxClientTrait for MockNetBoxClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn validate_token(&self) -> Result<(), NetBoxError> {
        Ok(())
    }

    // IPAM Operations - delegated to ipam module
    async fn get_prefix(&self, id: u64) -> Result<Prefix, NetBoxError> {
        ipam::get_prefix(self, id).await
    }

    async fn query_prefixes(&self, filters: &[(&str, &str)], fetch_all: bool) -> Result<Vec<Prefix>, NetBoxError> {
        ipam::query_prefixes(self, filters, fetch_all).await
    }

    async fn get_available_ips(&self, prefix_id: u64, limit: Option<u32>) -> Result<Vec<AvailableIP>, NetBoxError> {
        ipam::get_available_ips(self, prefix_id, limit).await
    }

    async fn create_ip_address(&self, request: &IPAddressRequest) -> Result<IPAddress, NetBoxError> {
        ipam::create_ip_address(self, request).await
    }
}
