//! Authenticated HTTP plumbing shared by every NetBox endpoint

pub mod query;

use crate::error::NetBoxError;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One page of a NetBox list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// NetBox HTTP client carrying the API token
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpClient {
    pub fn new(client: Client, base_url: String, token: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an API path such as `/api/ipam/prefixes/`
    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Resolve a pagination link against our base URL.
    ///
    /// NetBox builds `next` from the host it believes it is serving, which
    /// behind a proxy is often not the one we reach it on. Only the path and
    /// query of an absolute link are kept.
    pub fn page_url(&self, link: &str) -> String {
        let Some((_, rest)) = link.split_once("://") else {
            return self.build_url(link);
        };
        match rest.find('/') {
            Some(start) => self.build_url(&rest[start..]),
            None => self.build_url("/"),
        }
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        debug!("{} {}", method, url);
        self.client
            .request(method, url)
            .header("Authorization", format!("Token {}", self.token))
            .header("Accept", "application/json")
    }

    /// Follow `next` links from `url` until the last page
    pub async fn fetch_all_pages<T: DeserializeOwned>(&self, url: String) -> Result<Vec<T>, NetBoxError> {
        let mut results = Vec::new();
        let mut next = Some(url);

        while let Some(url) = next.take() {
            let response = self.request(Method::GET, &url).send().await?;
            let page: PaginatedResponse<T> = decode(response).await?;
            results.extend(page.results);
            next = page.next.map(|link| self.page_url(&link));
        }

        Ok(results)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, NetBoxError> {
        let response = self.request(Method::GET, &self.build_url(path)).send().await?;
        decode(response).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, NetBoxError> {
        let response = self
            .request(Method::POST, &self.build_url(path))
            .json(body)
            .send()
            .await?;
        decode(response).await
    }
}

/// Body as `T` on 2xx, otherwise `NetBoxError::Api` with the raw body.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, NetBoxError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(NetBoxError::Api {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        debug!(
            "Undecodable NetBox response ({}), first 500 chars: {}",
            e,
            body.chars().take(500).collect::<String>()
        );
        NetBoxError::Serialization(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http() -> HttpClient {
        HttpClient::new(Client::new(), "https://netbox.example.com/".to_string(), "t".to_string())
    }

    #[test]
    fn test_build_url() {
        assert_eq!(http().base_url(), "https://netbox.example.com");
        assert_eq!(
            http().build_url("/api/ipam/prefixes/"),
            "https://netbox.example.com/api/ipam/prefixes/"
        );
    }

    #[test]
    fn test_page_url_keeps_our_host() {
        assert_eq!(
            http().page_url("http://netbox.netbox.svc:8080/api/ipam/prefixes/?limit=50&offset=50"),
            "https://netbox.example.com/api/ipam/prefixes/?limit=50&offset=50"
        );
        assert_eq!(
            http().page_url("/api/ipam/prefixes/?offset=50"),
            "https://netbox.example.com/api/ipam/prefixes/?offset=50"
        );
    }
}
