//! IPAM operations for MockNetBoxClient
//!
//! Handles prefixes, available IPs and IP address creation

use super::{helpers, lock, MockNetBoxClient};
use crate::error::NetBoxError;
use crate::models::*;

fn not_found() -> NetBoxError {
    NetBoxError::Api {
        status: 404,
        body: r#"{"detail":"No Prefix matches the given query."}"#.to_string(),
    }
}

pub async fn get_prefix(client: &MockNetBoxClient, id: u64) -> Result<Prefix, NetBoxError> {
    lock(&client.prefixes).get(&id).cloned().ok_or_else(not_found)
}

pub async fn query_prefixes(client: &MockNetBoxClient, filters: &[(&str, &str)], _fetch_all: bool) -> Result<Vec<Prefix>, NetBoxError> {
    let mut results: Vec<Prefix> = lock(&client.prefixes).values().cloned().collect();

    // Apply filters (simplified - only handles custom field equality, `cf_<name>=<value>`)
    for (key, value) in filters {
        if let Some(field) = key.strip_prefix("cf_") {
            results.retain(|p| p.custom_field_str(field) == Some(*value));
        }
    }

    Ok(results)
}

pub async fn get_available_ips(client: &MockNetBoxClient, prefix_id: u64, limit: Option<u32>) -> Result<Vec<AvailableIP>, NetBoxError> {
    if !lock(&client.prefixes).contains_key(&prefix_id) {
        return Err(not_found());
    }
    *lock(&client.available_ip_queries) += 1;

    let mut ips = lock(&client.available_ips)
        .get(&prefix_id)
        .cloned()
        .unwrap_or_default();
    if let Some(limit) = limit {
        ips.truncate(limit as usize);
    }
    Ok(ips)
}

pub async fn create_ip_address(client: &MockNetBoxClient, request: &IPAddressRequest) -> Result<IPAddress, NetBoxError> {
    lock(&client.create_requests).push(request.clone());

    if let Some(status) = *lock(&client.denied_writes) {
        return Err(NetBoxError::Api {
            status,
            body: r#"{"detail":"You do not have permission to perform this action."}"#.to_string(),
        });
    }

    let duplicate = lock(&client.ip_addresses)
        .values()
        .any(|ip| ip.address == request.address);
    if duplicate {
        // The address is taken, so later available-IPs answers no longer list it
        drop_available(client, &request.address);
        return Err(NetBoxError::Api {
            status: 400,
            body: format!(
                r#"{{"address":["Duplicate IP address found in global table: {}"]}}"#,
                request.address
            ),
        });
    }

    let id = client.next_id();
    let mut ip = helpers::ip_address(
        id,
        &request.address,
        request.description.as_deref().unwrap_or_default(),
    );
    ip.dns_name = request.dns_name.clone().unwrap_or_default();

    lock(&client.ip_addresses).insert(id, ip.clone());
    drop_available(client, &request.address);
    Ok(ip)
}

fn drop_available(client: &MockNetBoxClient, address: &str) {
    for ips in lock(&client.available_ips).values_mut() {
        ips.retain(|available| available.address != address);
    }
}
