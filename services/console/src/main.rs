//! Machine Console
//!
//! JSON API in front of Kubernetes, KubeVirt and NetBox:
//! - Lists namespaces, events and machines as the calling user
//! - Creates machines with an address reserved from the NetBox pool
//!
//! Authentication happens upstream; requests carry the user's bearer token,
//! which is forwarded to the API server so RBAC applies per user.

mod config;
mod error;
mod extract;
mod metrics;
mod oidc;
mod routes;
mod state;

use anyhow::Context;
use cluster_client::build_http_client;
use config::ConsoleConfig;
use metrics::Metrics;
use netbox_client::{NetBoxClient, NetBoxClientTrait};
use oidc::OidcProvider;
use provisioner::{IpReserver, ProvisionObserver, Provisioner};
use state::{AppState, ClusterConnector, HttpClusterConnector};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Machine Console");

    let config = ConsoleConfig::from_env().context("loading configuration")?;
    config.log_summary();

    let netbox = NetBoxClient::new(config.netbox_url.clone(), config.netbox_token.clone())
        .context("creating NetBox client")?;
    // Startup continues without NetBox; reservations fail until it is reachable
    if let Err(e) = netbox.validate_token().await {
        warn!("NetBox token check failed: {}", e);
    }

    let ca_pem = match &config.kube_ca_file {
        Some(path) => Some(
            std::fs::read(path).with_context(|| format!("reading KUBE_CA_FILE {}", path.display()))?,
        ),
        None => None,
    };
    let http = build_http_client(ca_pem.as_deref()).context("creating Kubernetes HTTP client")?;
    let connector = HttpClusterConnector::new(http, config.kube_url.clone());

    let metrics = Arc::new(Metrics::new().context("registering metrics")?);

    let netbox: Arc<dyn NetBoxClientTrait> = Arc::new(netbox);
    let reserver = IpReserver::new(netbox, config.pool.clone()).with_max_attempts(config.reserve_attempts);
    let provisioner = Provisioner::new(reserver)
        .with_image_namespace(config.image_namespace.clone())
        .with_observer(Arc::clone(&metrics) as Arc<dyn ProvisionObserver>);

    let oidc = OidcProvider::new(config.oidc.clone()).context("creating OIDC provider")?;
    // Discovery failure is not fatal; it is retried on the next use
    if oidc.metadata().await.is_err() {
        warn!("OIDC provider not reachable yet, will retry on demand");
    }

    let listen_addr = config.listen_addr;
    let state = AppState {
        config: Arc::new(config),
        cluster: Arc::new(connector) as Arc<dyn ClusterConnector>,
        provisioner: Arc::new(provisioner),
        oidc: Arc::new(oidc),
        metrics,
    };

    let app = routes::router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("binding {}", listen_addr))?;
    info!("Listening on {}", listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    info!("Machine Console stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
