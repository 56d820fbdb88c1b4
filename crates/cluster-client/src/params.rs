//! List parameters and list envelopes

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ListMeta;
use serde::{Deserialize, Deserializer, Serialize};

/// Query parameters for list calls, forwarded to the API server verbatim
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    /// `labelSelector`, e.g. `app=web,tier!=cache`
    pub label_selector: Option<String>,
    /// `limit`, the page size the server may honor
    pub limit: Option<u32>,
}

impl ListParams {
    /// Restrict to objects matching a label selector
    #[must_use]
    pub fn labels(mut self, selector: &str) -> Self {
        self.label_selector = Some(selector.to_string());
        self
    }

    /// Ask the server for at most `limit` objects
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Encode as a query string, without the leading `?`. Empty when no
    /// parameter is set.
    pub fn to_query(&self) -> String {
        let mut pairs = Vec::new();
        if let Some(selector) = &self.label_selector {
            pairs.push(format!("labelSelector={}", urlencoding::encode(selector)));
        }
        if let Some(limit) = self.limit {
            pairs.push(format!("limit={}", limit));
        }
        pairs.join("&")
    }
}

/// `*List` envelope returned by list endpoints
///
/// Some servers send `items: null` for empty lists; that reads as empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceList<T> {
    #[serde(default)]
    pub metadata: ListMeta,
    #[serde(
        default = "Vec::new",
        deserialize_with = "null_as_empty",
        bound(deserialize = "T: Deserialize<'de>")
    )]
    pub items: Vec<T>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
