//! Fixture builders

use crate::models::*;

/// Pool prefix with the given custom fields
pub fn prefix(id: u64, cidr: &str, custom_fields: serde_json::Value) -> Prefix {
    Prefix {
        id,
        prefix: cidr.to_string(),
        description: String::new(),
        custom_fields,
    }
}

/// Entry as the available-ips endpoint lists it
pub fn available_ip(address: &str) -> AvailableIP {
    AvailableIP {
        family: if address.contains(':') { 6 } else { 4 },
        address: address.to_string(),
    }
}

/// Address as NetBox returns it after creation
pub(crate) fn ip_address(id: u64, address: &str, description: &str) -> IPAddress {
    IPAddress {
        id,
        address: address.to_string(),
        dns_name: String::new(),
        description: description.to_string(),
    }
}
