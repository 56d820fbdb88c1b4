//! OIDC provider handle
//!
//! Built once at startup and shared. Provider metadata is discovered on
//! first use and cached only once discovery succeeds, so an identity
//! provider that is down at startup is retried on the next call instead of
//! failing the process or poisoning the cache.

use crate::error::ConsoleError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Scopes requested at login
pub const DEFAULT_SCOPES: [&str; 4] = ["openid", "email", "profile", "groups"];

/// Identity provider settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OidcConfig {
    /// Issuer URL, without trailing slash
    pub issuer: String,
    pub client_id: String,
    /// Audience requested for access tokens; empty for none
    pub audience: String,
    /// External base URL of the console; the callback path is appended
    pub redirect_base: String,
    pub scopes: Vec<String>,
}

impl OidcConfig {
    pub fn discovery_url(&self) -> String {
        format!("{}/.well-known/openid-configuration", self.issuer)
    }

    pub fn redirect_uri(&self) -> String {
        format!("{}/auth/callback", self.redirect_base.trim_end_matches('/'))
    }
}

/// Subset of the discovery document the console uses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    #[serde(default)]
    pub jwks_uri: Option<String>,
    #[serde(default)]
    pub userinfo_endpoint: Option<String>,
    #[serde(default)]
    pub end_session_endpoint: Option<String>,
}

/// Public login settings handed to the browser
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSettings {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_session_endpoint: Option<String>,
    pub client_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub audience: String,
    pub redirect_uri: String,
    pub scope: String,
    pub code_challenge_method: &'static str,
}

#[derive(Debug)]
pub struct OidcProvider {
    config: OidcConfig,
    http: reqwest::Client,
    metadata: OnceCell<ProviderMetadata>,
}

impl OidcProvider {
    pub fn new(config: OidcConfig) -> Result<Self, ConsoleError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ConsoleError::Oidc(format!("building HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http,
            metadata: OnceCell::new(),
        })
    }

    pub fn config(&self) -> &OidcConfig {
        &self.config
    }

    /// Whether discovery has succeeded yet
    pub fn is_discovered(&self) -> bool {
        self.metadata.initialized()
    }

    /// Provider metadata, discovering it if no attempt has succeeded yet
    pub async fn metadata(&self) -> Result<&ProviderMetadata, ConsoleError> {
        self.metadata.get_or_try_init(|| self.discover()).await
    }

    async fn discover(&self) -> Result<ProviderMetadata, ConsoleError> {
        let url = self.config.discovery_url();
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| discovery_failed(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(discovery_failed(&url, format!("status {}", status)));
        }

        let metadata: ProviderMetadata = response
            .json()
            .await
            .map_err(|e| discovery_failed(&url, e))?;

        if metadata.issuer.trim_end_matches('/') != self.config.issuer {
            return Err(discovery_failed(
                &url,
                format!("document names issuer {}", metadata.issuer),
            ));
        }

        info!("Discovered OIDC provider {}", metadata.issuer);
        Ok(metadata)
    }

    /// Login settings for the browser, discovering the provider if needed
    pub async fn auth_settings(&self) -> Result<AuthSettings, ConsoleError> {
        let metadata = self.metadata().await?;

        Ok(AuthSettings {
            issuer: metadata.issuer.clone(),
            authorization_endpoint: metadata.authorization_endpoint.clone(),
            token_endpoint: metadata.token_endpoint.clone(),
            end_session_endpoint: metadata.end_session_endpoint.clone(),
            client_id: self.config.client_id.clone(),
            audience: self.config.audience.clone(),
            redirect_uri: self.config.redirect_uri(),
            scope: self.config.scopes.join(" "),
            code_challenge_method: "S256",
        })
    }
}

fn discovery_failed(url: &str, cause: impl std::fmt::Display) -> ConsoleError {
    warn!("OIDC discovery from {} failed: {}", url, cause);
    ConsoleError::Oidc(format!("discovery from {} failed: {}", url, cause))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Serve a discovery document that fails the first `failures` requests.
    /// The document names `advertised` as issuer, or the server itself.
    async fn fake_issuer(failures: u32, advertised: Option<&str>) -> (String, Arc<AtomicU32>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicU32::new(0));

        let doc_base = base.clone();
        let doc_issuer = advertised.map_or_else(|| base.clone(), ToString::to_string);
        let counter = Arc::clone(&hits);
        let app = Router::new().route(
            "/.well-known/openid-configuration",
            get(move || {
                let base = doc_base.clone();
                let issuer = doc_issuer.clone();
                let counter = Arc::clone(&counter);
                async move {
                    let hit = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if hit <= failures {
                        return Err(StatusCode::SERVICE_UNAVAILABLE);
                    }
                    Ok(Json(serde_json::json!({
                        "issuer": issuer,
                        "authorization_endpoint": format!("{}/authorize", base),
                        "token_endpoint": format!("{}/token", base),
                        "jwks_uri": format!("{}/keys", base),
                    })))
                }
            }),
        );
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (base, hits)
    }

    fn config(issuer: &str) -> OidcConfig {
        OidcConfig {
            issuer: issuer.to_string(),
            client_id: "console".to_string(),
            audience: "kubernetes".to_string(),
            redirect_base: "https://console.example.com/".to_string(),
            scopes: DEFAULT_SCOPES.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_urls() {
        let config = config("https://sso.example.com");
        assert_eq!(config.discovery_url(), "https://sso.example.com/.well-known/openid-configuration");
        assert_eq!(config.redirect_uri(), "https://console.example.com/auth/callback");
    }

    #[tokio::test]
    async fn test_failed_discovery_is_retried() {
        let (issuer, hits) = fake_issuer(1, None).await;
        let provider = OidcProvider::new(config(&issuer)).unwrap();

        assert!(matches!(provider.metadata().await, Err(ConsoleError::Oidc(_))));
        assert!(!provider.is_discovered());

        let metadata = provider.metadata().await.unwrap();
        assert_eq!(metadata.token_endpoint, format!("{}/token", issuer));
        assert!(provider.is_discovered());

        // Cached after success
        provider.metadata().await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_issuer_mismatch_rejected() {
        let (issuer, _) = fake_issuer(0, Some("https://someone-else.example.com")).await;
        let provider = OidcProvider::new(config(&issuer)).unwrap();

        let err = provider.metadata().await.unwrap_err();
        assert!(err.to_string().contains("someone-else"));
        assert!(!provider.is_discovered());
    }

    #[tokio::test]
    async fn test_auth_settings() {
        let (issuer, _) = fake_issuer(0, None).await;
        let provider = OidcProvider::new(config(&issuer)).unwrap();

        let settings = provider.auth_settings().await.unwrap();
        assert_eq!(settings.authorization_endpoint, format!("{}/authorize", issuer));
        assert_eq!(settings.client_id, "console");
        assert_eq!(settings.audience, "kubernetes");
        assert_eq!(settings.redirect_uri, "https://console.example.com/auth/callback");
        assert_eq!(settings.scope, "openid email profile groups");
    }
}
