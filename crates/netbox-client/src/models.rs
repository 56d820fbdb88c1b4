//! NetBox IPAM models
//!
//! Only the fields provisioning reads are modelled; unknown fields are
//! ignored and missing optional ones default.

use serde::{Deserialize, Serialize};

/// IPAM prefix; the pool tag and gateway live in custom fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prefix {
    pub id: u64,
    /// CIDR, e.g. "10.0.0.0/24"
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub custom_fields: serde_json::Value,
}

impl Prefix {
    /// String value of a custom field, if set and textual.
    pub fn custom_field_str(&self, name: &str) -> Option<&str> {
        self.custom_fields.get(name).and_then(serde_json::Value::as_str)
    }

    /// Gateway address stored in the `gateway` custom field.
    ///
    /// NetBox renders object-typed custom fields as nested objects
    /// (`{"id": 7, "address": "10.0.0.1/24", ...}`); plain text fields are
    /// accepted too. Returned in the form NetBox stores it, usually CIDR.
    pub fn gateway(&self) -> Option<&str> {
        let field = self.custom_fields.get("gateway")?;
        field
            .get("address")
            .and_then(serde_json::Value::as_str)
            .or_else(|| field.as_str())
            .filter(|address| !address.is_empty())
    }
}

/// Allocated IP address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IPAddress {
    pub id: u64,
    /// CIDR, e.g. "10.0.0.5/24"
    pub address: String,
    #[serde(default)]
    pub dns_name: String,
    #[serde(default)]
    pub description: String,
}

/// Free address as listed by `available-ips`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableIP {
    #[serde(default)]
    pub family: u8,
    pub address: String,
}

/// Body for creating an IP address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IPAddressRequest {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<IPAddressStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum IPAddressStatus {
    Active,
    Reserved,
    Deprecated,
    Dhcp,
    #[serde(rename = "slaac")]
    Slaac,
}
