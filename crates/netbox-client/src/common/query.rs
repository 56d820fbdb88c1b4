//! Filtered list queries

use crate::common::{HttpClient, PaginatedResponse};
use crate::error::NetBoxError;
use serde::de::DeserializeOwned;

/// Encode `(key, value)` filter pairs as a query string (no leading `?`).
pub fn encode_filters(filters: &[(&str, &str)]) -> String {
    filters
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// List path with filters appended, e.g. `/api/ipam/prefixes/?status=active`
pub fn list_path(endpoint: &str, filters: &[(&str, &str)]) -> String {
    if filters.is_empty() {
        format!("/api/{}/", endpoint)
    } else {
        format!("/api/{}/?{}", endpoint, encode_filters(filters))
    }
}

/// List `endpoint` (relative to `/api/`) with filters. Only the first page
/// is returned unless `fetch_all` is set.
pub async fn query_resources<T: DeserializeOwned>(
    http: &HttpClient,
    endpoint: &str,
    filters: &[(&str, &str)],
    fetch_all: bool,
) -> Result<Vec<T>, NetBoxError> {
    let path = list_path(endpoint, filters);

    if fetch_all {
        return http.fetch_all_pages(http.build_url(&path)).await;
    }
    let page: PaginatedResponse<T> = http.get(&path).await?;
    Ok(page.results)
}
