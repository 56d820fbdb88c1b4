//! IP address reservation in NetBox
//!
//! The pool prefix is found by a custom field tag. An address is reserved by
//! listing the prefix's available IPs, picking one at random and creating it
//! as an IP address object. Another caller may take the same address between
//! the list and the create; NetBox then rejects the create and the list is
//! re-queried, a bounded number of times.

use crate::error::ProvisionError;
use crate::machine::bare_address;
use netbox_client::{AvailableIP, IPAddressRequest, IPAddressStatus, NetBoxClientTrait, Prefix};
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

pub const DEFAULT_POOL_FIELD: &str = "monsoon_pool";
pub const DEFAULT_POOL_VALUE: &str = "external";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Custom field equality that marks the pool prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSelector {
    pub field: String,
    pub value: String,
}

impl Default for PoolSelector {
    fn default() -> Self {
        Self {
            field: DEFAULT_POOL_FIELD.to_string(),
            value: DEFAULT_POOL_VALUE.to_string(),
        }
    }
}

/// An address created in NetBox for one machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedAddress {
    /// NetBox IP address object ID
    pub id: u64,
    /// Address with prefix length, e.g. "10.0.0.5/24"
    pub cidr: String,
}

impl ReservedAddress {
    /// Address without prefix length
    pub fn bare(&self) -> &str {
        bare_address(&self.cidr)
    }
}

/// Reserves addresses from the pool prefix
#[derive(Debug, Clone)]
pub struct IpReserver<C: NetBoxClientTrait> {
    client: C,
    pool: PoolSelector,
    max_attempts: u32,
}

impl<C: NetBoxClientTrait> IpReserver<C> {
    pub fn new(client: C, pool: PoolSelector) -> Self {
        Self {
            client,
            pool,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Number of create attempts before giving up; at least one.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn pool(&self) -> &PoolSelector {
        &self.pool
    }

    /// Find the one prefix tagged with the pool value.
    ///
    /// Every page is read. No match and several matches are both
    /// configuration errors.
    pub async fn find_prefix(&self) -> Result<Prefix, ProvisionError> {
        let filter_key = format!("cf_{}", self.pool.field);
        let prefixes = self
            .client
            .query_prefixes(&[(filter_key.as_str(), self.pool.value.as_str())], true)
            .await?;

        // The server-side filter is ignored by NetBox for unknown fields
        let mut matching: Vec<Prefix> = prefixes
            .into_iter()
            .filter(|p| p.custom_field_str(&self.pool.field) == Some(self.pool.value.as_str()))
            .collect();

        match matching.len() {
            0 => Err(ProvisionError::Configuration(format!(
                "no prefix found in NetBox with {} {}",
                self.pool.field, self.pool.value
            ))),
            1 => {
                let prefix = matching.remove(0);
                debug!("Using prefix {} (ID: {}) for pool {}", prefix.prefix, prefix.id, self.pool.value);
                Ok(prefix)
            }
            n => {
                let ids: Vec<String> = matching.iter().map(|p| p.id.to_string()).collect();
                Err(ProvisionError::Configuration(format!(
                    "{} prefixes in NetBox with {} {} (IDs: {}), expected exactly one",
                    n,
                    self.pool.field,
                    self.pool.value,
                    ids.join(", ")
                )))
            }
        }
    }

    /// Bare gateway address of the pool prefix.
    pub fn prefix_gateway(&self, prefix: &Prefix) -> Result<String, ProvisionError> {
        prefix
            .gateway()
            .map(|gateway| bare_address(gateway).to_string())
            .ok_or_else(|| {
                ProvisionError::Configuration(format!(
                    "prefix {} (ID: {}) missing IPv4 gateway address",
                    prefix.prefix, prefix.id
                ))
            })
    }

    /// Reserve a random available address of `prefix_id`.
    ///
    /// # Returns
    /// * `Ok(ReservedAddress)` - an address from the latest available-IPs answer
    /// * `Err(ProvisionError::ExhaustedPool)` - nothing available, no create attempted
    /// * `Err(ProvisionError::NetBox)` - the last create error once attempts run out,
    ///   or any other error immediately
    pub async fn reserve_ip_address(&self, prefix_id: u64, description: &str) -> Result<ReservedAddress, ProvisionError> {
        let mut attempt = 1;

        loop {
            let available = self.client.get_available_ips(prefix_id, None).await?;
            let Some(address) = pick_random(&available) else {
                warn!("No available IPs in prefix {}", prefix_id);
                return Err(ProvisionError::ExhaustedPool { prefix_id });
            };

            let request = IPAddressRequest {
                address: address.clone(),
                description: Some(description.to_string()),
                status: Some(IPAddressStatus::Active),
                dns_name: None,
            };

            match self.client.create_ip_address(&request).await {
                Ok(created) => {
                    info!("Reserved {} in prefix {} for {} (NetBox ID: {})", address, prefix_id, description, created.id);
                    return Ok(ReservedAddress { id: created.id, cidr: address });
                }
                Err(e) if e.is_conflict() && attempt < self.max_attempts => {
                    warn!(
                        "Reserving {} for {} rejected (attempt {}/{}), picking again: {}",
                        address, description, attempt, self.max_attempts, e
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Uniformly random address out of an available-IPs answer
fn pick_random(available: &[AvailableIP]) -> Option<String> {
    available
        .choose(&mut rand::thread_rng())
        .map(|ip| ip.address.clone())
}
