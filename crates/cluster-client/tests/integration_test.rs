//! Integration tests for the cluster client
//!
//! These tests require a reachable API server with KubeVirt installed.
//! Set KUBE_URL and KUBE_TOKEN (and optionally KUBE_CA_FILE) to run.

use cluster_client::{ClusterClient, ListParams};

fn client_from_env() -> ClusterClient {
    let url = std::env::var("KUBE_URL")
        .unwrap_or_else(|_| "https://localhost:6443".to_string());
    let token = std::env::var("KUBE_TOKEN")
        .expect("KUBE_TOKEN environment variable must be set");
    let ca = std::env::var("KUBE_CA_FILE")
        .ok()
        .map(|path| std::fs::read(path).expect("Failed to read CA file"));

    ClusterClient::new(url, token, ca.as_deref()).expect("Failed to create client")
}

#[tokio::test]
#[ignore] // Requires running API server
async fn test_list_namespaces() {
    let client = client_from_env();

    let namespaces = client.list_namespaces(&ListParams::default().limit(5)).await
        .expect("Failed to list namespaces");

    assert!(namespaces.len() <= 5);
}

#[tokio::test]
#[ignore]
async fn test_list_compute_classes() {
    let client = client_from_env();

    let classes = client.list_compute_classes(&ListParams::default()).await
        .expect("Failed to list compute classes");

    println!("Found {} compute classes", classes.len());
}

#[tokio::test]
#[ignore]
async fn test_missing_vm_is_404() {
    let client = client_from_env();

    let err = client.get_virtual_machine("default", "does-not-exist-4f1c").await.unwrap_err();
    assert!(err.is_not_found());
}
