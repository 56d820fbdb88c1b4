//! NetBox API client
//!
//! Endpoints used:
//! - `GET  /api/status/` - token check
//! - `GET  /api/ipam/prefixes/` and `/api/ipam/prefixes/{id}/`
//! - `GET  /api/ipam/prefixes/{id}/available-ips/`
//! - `POST /api/ipam/ip-addresses/`

use crate::common::query::query_resources;
use crate::common::HttpClient;
use crate::error::NetBoxError;
use crate::models::*;
use crate::netbox_trait::NetBoxClientTrait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

const PREFIXES: &str = "ipam/prefixes";

/// NetBox API client
#[derive(Debug, Clone)]
pub struct NetBoxClient {
    http: HttpClient,
}

impl NetBoxClient {
    /// Create a client for `base_url` (e.g. "http://netbox.netbox:80")
    /// authenticating with an API token.
    pub fn new(base_url: String, token: String) -> Result<Self, NetBoxError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            http: HttpClient::new(client, base_url, token),
        })
    }

    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    /// Check that NetBox is reachable and accepts the token.
    pub async fn validate_token(&self) -> Result<(), NetBoxError> {
        let status: serde_json::Value = self.http.get("/api/status/").await?;
        debug!(
            "NetBox reachable, version {}",
            status.get("netbox-version").and_then(|v| v.as_str()).unwrap_or("unknown")
        );
        Ok(())
    }

    pub async fn get_prefix(&self, id: u64) -> Result<Prefix, NetBoxError> {
        self.http.get(&format!("/api/{}/{}/", PREFIXES, id)).await
    }

    /// Prefixes matching `filters`, passed to NetBox as query parameters.
    /// With `fetch_all`, every page is followed.
    pub async fn query_prefixes(&self, filters: &[(&str, &str)], fetch_all: bool) -> Result<Vec<Prefix>, NetBoxError> {
        query_resources(&self.http, PREFIXES, filters, fetch_all).await
    }

    /// Addresses NetBox considers free in the prefix, lowest first.
    pub async fn get_available_ips(&self, prefix_id: u64, limit: Option<u32>) -> Result<Vec<AvailableIP>, NetBoxError> {
        let path = match limit {
            Some(limit) => format!("/api/{}/{}/available-ips/?limit={}", PREFIXES, prefix_id, limit),
            None => format!("/api/{}/{}/available-ips/", PREFIXES, prefix_id),
        };
        self.http.get(&path).await
    }

    /// Record an address as allocated.
    ///
    /// With uniqueness enforced, NetBox answers 400 when the address was
    /// taken in the meantime.
    pub async fn create_ip_address(&self, request: &IPAddressRequest) -> Result<IPAddress, NetBoxError> {
        self.http.post("/api/ipam/ip-addresses/", request).await
    }
}

#[async_trait::async_trait]
impl NetBoxClientTrait for NetBoxClient {
    fn base_url(&self) -> &str {
        self.base_url()
    }

    async fn validate_token(&self) -> Result<(), NetBoxError> {
        self.validate_token().await
    }

    async fn get_prefix(&self, id: u64) -> Result<Prefix, NetBoxError> {
        self.get_prefix(id).await
    }

    async fn query_prefixes(&self, filters: &[(&str, &str)], fetch_all: bool) -> Result<Vec<Prefix>, NetBoxError> {
        self.query_prefixes(filters, fetch_all).await
    }

    async fn get_available_ips(&self, prefix_id: u64, limit: Option<u32>) -> Result<Vec<AvailableIP>, NetBoxError> {
        self.get_available_ips(prefix_id, limit).await
    }

    async fn create_ip_address(&self, request: &IPAddressRequest) -> Result<IPAddress, NetBoxError> {
        self.create_ip_address(request).await
    }
}
