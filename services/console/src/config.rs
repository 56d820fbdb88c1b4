//! Console configuration
//!
//! Read once at startup from environment variables. `from_lookup` takes any
//! lookup function so tests do not have to touch the process environment.

use crate::error::ConsoleError;
use crate::oidc::{OidcConfig, DEFAULT_SCOPES};
use provisioner::reservation::{DEFAULT_MAX_ATTEMPTS, DEFAULT_POOL_FIELD, DEFAULT_POOL_VALUE};
use provisioner::machine::DEFAULT_IMAGE_NAMESPACE;
use provisioner::PoolSelector;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

/// Label marking namespaces and images the console works with
pub const DEFAULT_ENABLED_SELECTOR: &str = "monsoon.ianunruh.com/enabled=true";

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub listen_addr: SocketAddr,

    /// Kubernetes API server URL
    pub kube_url: String,
    /// PEM bundle trusted for the API server
    pub kube_ca_file: Option<PathBuf>,
    /// Selector for namespaces shown to users
    pub namespace_selector: String,

    /// Namespace holding image PVCs
    pub image_namespace: String,
    pub image_selector: String,

    pub netbox_url: String,
    pub netbox_token: String,
    pub pool: PoolSelector,
    pub reserve_attempts: u32,

    pub oidc: OidcConfig,
}

impl ConsoleConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConsoleError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConsoleError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or_default = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());
        let required = |key: &str| {
            get(key).ok_or_else(|| {
                ConsoleError::InvalidConfig(format!("{} environment variable is required", key))
            })
        };

        let listen_addr = or_default("LISTEN_ADDR", "0.0.0.0:8080")
            .parse::<SocketAddr>()
            .map_err(|e| ConsoleError::InvalidConfig(format!("LISTEN_ADDR: {}", e)))?;

        let reserve_attempts = match get("IPAM_RESERVE_ATTEMPTS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    ConsoleError::InvalidConfig(format!(
                        "IPAM_RESERVE_ATTEMPTS must be a positive integer, got {:?}",
                        raw
                    ))
                })?,
            None => DEFAULT_MAX_ATTEMPTS,
        };

        Ok(Self {
            listen_addr,
            kube_url: required("KUBE_URL")?.trim_end_matches('/').to_string(),
            kube_ca_file: get("KUBE_CA_FILE").map(PathBuf::from),
            namespace_selector: or_default("KUBE_NS_LABEL_SELECTOR", DEFAULT_ENABLED_SELECTOR),
            image_namespace: or_default("IMAGE_NAMESPACE", DEFAULT_IMAGE_NAMESPACE),
            image_selector: or_default("IMAGE_LABEL_SELECTOR", DEFAULT_ENABLED_SELECTOR),
            netbox_url: or_default("NETBOX_URL", "http://netbox.netbox:80"),
            netbox_token: required("NETBOX_TOKEN")?,
            pool: PoolSelector {
                field: or_default("IPAM_POOL_FIELD", DEFAULT_POOL_FIELD),
                value: or_default("IPAM_POOL_VALUE", DEFAULT_POOL_VALUE),
            },
            reserve_attempts,
            oidc: OidcConfig {
                issuer: required("OIDC_ISSUER")?.trim_end_matches('/').to_string(),
                client_id: required("OIDC_CLIENT_ID")?,
                audience: get("OIDC_AUDIENCE").unwrap_or_default(),
                redirect_base: get("OIDC_REDIRECT_BASE").unwrap_or_default(),
                scopes: DEFAULT_SCOPES.iter().map(ToString::to_string).collect(),
            },
        })
    }

    /// Log the effective configuration, secrets left out
    pub fn log_summary(&self) {
        info!("Configuration:");
        info!("  Listen address: {}", self.listen_addr);
        info!("  Kubernetes URL: {}", self.kube_url);
        info!("  Namespace selector: {}", self.namespace_selector);
        info!("  Images: {} ({})", self.image_namespace, self.image_selector);
        info!("  NetBox URL: {}", self.netbox_url);
        info!("  Address pool: {}={} ({} attempts)", self.pool.field, self.pool.value, self.reserve_attempts);
        info!("  OIDC issuer: {}", self.oidc.issuer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("KUBE_URL", "https://k8s.example.com:6443/"),
        ("NETBOX_TOKEN", "secret"),
        ("OIDC_ISSUER", "https://sso.example.com/"),
        ("OIDC_CLIENT_ID", "console"),
    ];

    #[test]
    fn test_defaults() {
        let config = ConsoleConfig::from_lookup(env(REQUIRED)).unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.kube_url, "https://k8s.example.com:6443");
        assert_eq!(config.kube_ca_file, None);
        assert_eq!(config.namespace_selector, "monsoon.ianunruh.com/enabled=true");
        assert_eq!(config.image_namespace, "vm-images");
        assert_eq!(config.image_selector, "monsoon.ianunruh.com/enabled=true");
        assert_eq!(config.netbox_url, "http://netbox.netbox:80");
        assert_eq!(config.pool, PoolSelector::default());
        assert_eq!(config.reserve_attempts, 3);
        assert_eq!(config.oidc.issuer, "https://sso.example.com");
        assert_eq!(config.oidc.audience, "");
        assert_eq!(config.oidc.scopes, vec!["openid", "email", "profile", "groups"]);
    }

    #[test]
    fn test_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("LISTEN_ADDR", "127.0.0.1:9000"),
            ("KUBE_CA_FILE", "/var/run/ca.crt"),
            ("IPAM_POOL_FIELD", "tier"),
            ("IPAM_POOL_VALUE", "lab"),
            ("IPAM_RESERVE_ATTEMPTS", "5"),
            ("OIDC_AUDIENCE", "kubernetes"),
        ]);
        let config = ConsoleConfig::from_lookup(env(&pairs)).unwrap();

        assert_eq!(config.listen_addr.port(), 9000);
        assert_eq!(config.kube_ca_file, Some(PathBuf::from("/var/run/ca.crt")));
        assert_eq!(config.pool.field, "tier");
        assert_eq!(config.pool.value, "lab");
        assert_eq!(config.reserve_attempts, 5);
        assert_eq!(config.oidc.audience, "kubernetes");
    }

    #[test]
    fn test_missing_required_variable() {
        for missing in ["KUBE_URL", "NETBOX_TOKEN", "OIDC_ISSUER", "OIDC_CLIENT_ID"] {
            let pairs: Vec<_> = REQUIRED.iter().copied().filter(|(k, _)| *k != missing).collect();
            let err = ConsoleConfig::from_lookup(env(&pairs)).unwrap_err();
            assert!(
                matches!(err, ConsoleError::InvalidConfig(ref msg) if msg.starts_with(missing)),
                "{} not reported: {}",
                missing,
                err
            );
        }
    }

    #[test]
    fn test_blank_required_variable_counts_as_missing() {
        let mut pairs = REQUIRED.to_vec();
        pairs.retain(|(k, _)| *k != "NETBOX_TOKEN");
        pairs.push(("NETBOX_TOKEN", "  "));
        assert!(ConsoleConfig::from_lookup(env(&pairs)).is_err());
    }

    #[test]
    fn test_invalid_values() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("IPAM_RESERVE_ATTEMPTS", "0"));
        assert!(matches!(ConsoleConfig::from_lookup(env(&pairs)), Err(ConsoleError::InvalidConfig(_))));

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("LISTEN_ADDR", "not-an-address"));
        assert!(matches!(ConsoleConfig::from_lookup(env(&pairs)), Err(ConsoleError::InvalidConfig(_))));
    }
}
