//! ClusterClient against a local HTTP server standing in for the API server

use crate::{ClusterClient, ClusterError, ListParams};
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::Router;
use crds::{VirtualMachine, VirtualMachineSpec};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const TOKEN: &str = "user-token";

#[derive(Debug, Clone)]
struct Seen {
    method: Method,
    uri: String,
    authorization: Option<String>,
    body: String,
}

/// Answers keyed by request path and query; anything else is a 404 Status.
#[derive(Debug, Default)]
struct FakeApiServer {
    answers: HashMap<String, (StatusCode, String)>,
    seen: Mutex<Vec<Seen>>,
}

impl FakeApiServer {
    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

async fn answer(
    State(server): State<Arc<FakeApiServer>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    server.seen.lock().unwrap().push(Seen {
        method,
        uri: uri.to_string(),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string),
        body,
    });
    server.answers.get(&uri.to_string()).cloned().unwrap_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            json!({"kind": "Status", "status": "Failure", "reason": "NotFound", "code": 404}).to_string(),
        )
    })
}

async fn serve(answers: Vec<(&str, StatusCode, String)>) -> (ClusterClient, Arc<FakeApiServer>) {
    let server = Arc::new(FakeApiServer {
        answers: answers
            .into_iter()
            .map(|(uri, status, body)| (uri.to_string(), (status, body)))
            .collect(),
        ..Default::default()
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}/", listener.local_addr().unwrap());
    let app = Router::new().fallback(answer).with_state(Arc::clone(&server));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = ClusterClient::new(base, TOKEN.to_string(), None).unwrap();
    (client, server)
}

#[tokio::test]
async fn test_list_sends_bearer_token_and_selector() {
    let (client, server) = serve(vec![(
        "/api/v1/namespaces?labelSelector=monsoon.ianunruh.com%2Fenabled%3Dtrue",
        StatusCode::OK,
        json!({
            "kind": "NamespaceList",
            "apiVersion": "v1",
            "metadata": {"resourceVersion": "42"},
            "items": [{"metadata": {"name": "team-a"}}, {"metadata": {"name": "team-b"}}]
        })
        .to_string(),
    )])
    .await;

    let params = ListParams::default().labels("monsoon.ianunruh.com/enabled=true");
    let namespaces = client.list_namespaces(&params).await.unwrap();

    let names: Vec<_> = namespaces.iter().filter_map(|ns| ns.metadata.name.as_deref()).collect();
    assert_eq!(names, ["team-a", "team-b"]);

    let seen = server.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, Method::GET);
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer user-token"));
}

#[tokio::test]
async fn test_empty_namespace_lists_nothing() {
    let (client, _server) = serve(vec![
        (
            "/apis/kubevirt.io/v1/namespaces/empty/virtualmachines",
            StatusCode::OK,
            json!({"kind": "VirtualMachineList", "metadata": {}, "items": []}).to_string(),
        ),
        (
            "/api/v1/namespaces/empty/events",
            StatusCode::OK,
            json!({"kind": "EventList", "metadata": {}, "items": null}).to_string(),
        ),
    ])
    .await;

    let vms = client.list_virtual_machines("empty", &ListParams::default()).await.unwrap();
    assert!(vms.is_empty());

    let events = client.list_events("empty", &ListParams::default()).await.unwrap();
    assert!(events.is_empty());
}

#[tokio::test]
async fn test_not_found_keeps_status_and_body() {
    let (client, _server) = serve(vec![]).await;

    let err = client.get_virtual_machine("team-a", "missing").await.unwrap_err();
    assert!(err.is_not_found());
    match err {
        ClusterError::Api { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("\"reason\":\"NotFound\""), "{}", body);
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_path_segments_are_encoded() {
    let (client, server) = serve(vec![]).await;

    let _ = client.get_virtual_machine("team-a/x", "vm 1").await;
    let _ = client.list_virtual_machines("a?b", &ListParams::default()).await;

    let uris: Vec<_> = server.seen().into_iter().map(|s| s.uri).collect();
    assert_eq!(
        uris,
        [
            "/apis/kubevirt.io/v1/namespaces/team-a%2Fx/virtualmachines/vm%201",
            "/apis/kubevirt.io/v1/namespaces/a%3Fb/virtualmachines",
        ]
    );
}

#[tokio::test]
async fn test_create_posts_manifest() {
    let mut created = VirtualMachine::new("vm1", VirtualMachineSpec::default());
    created.metadata.namespace = Some("team-a".to_string());
    created.metadata.uid = Some("0b7e".to_string());

    let (client, server) = serve(vec![(
        "/apis/kubevirt.io/v1/namespaces/team-a/virtualmachines",
        StatusCode::CREATED,
        serde_json::to_string(&created).unwrap(),
    )])
    .await;

    let vm = client
        .create_virtual_machine("team-a", &VirtualMachine::new("vm1", VirtualMachineSpec::default()))
        .await
        .unwrap();
    assert_eq!(vm.metadata.uid.as_deref(), Some("0b7e"));

    let seen = server.seen();
    assert_eq!(seen[0].method, Method::POST);
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer user-token"));
    let sent: serde_json::Value = serde_json::from_str(&seen[0].body).unwrap();
    assert_eq!(sent["kind"], "VirtualMachine");
    assert_eq!(sent["metadata"]["name"], "vm1");
}

#[tokio::test]
async fn test_conflict_passes_through() {
    let (client, _server) = serve(vec![(
        "/apis/kubevirt.io/v1/namespaces/team-a/virtualmachines",
        StatusCode::CONFLICT,
        json!({"kind": "Status", "reason": "AlreadyExists", "message": "virtualmachines.kubevirt.io \"vm1\" already exists", "code": 409})
            .to_string(),
    )])
    .await;

    let err = client
        .create_virtual_machine("team-a", &VirtualMachine::new("vm1", VirtualMachineSpec::default()))
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    assert!(err.to_string().contains("already exists"));
}
