use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use std::sync::Arc;
use tower::ServiceExt;

use vm_fleet_manager::agent::JnlpAgentPublisher;
use vm_fleet_manager::core::{ComputeNode, HostConnection, HostRegistry, Secret, VirtualizationHost};
use vm_fleet_manager::driver::InMemoryDriver;
use vm_fleet_manager::{create_router, AppState, DriverError};

const LAB1: &str = "http://lab1:18083";

fn app(driver: Arc<InMemoryDriver>) -> Router {
    let registry = HostRegistry::new();
    registry.register_host(VirtualizationHost::new(
        "lab1",
        HostConnection::new(LAB1, "jenkins", Secret::new("secret")),
        driver.clone(),
    ));

    create_router(AppState {
        registry: Arc::new(registry),
        nodes: Arc::new(vec![
            ComputeNode::new("virtual", "lab1", "vm-a"),
            ComputeNode::new("other", "lab1", "vm-b"),
        ]),
        driver,
        publisher: Arc::new(JnlpAgentPublisher::new("http://localhost:8080/hudson")),
    })
}

fn lab1_driver() -> Arc<InMemoryDriver> {
    let driver = Arc::new(InMemoryDriver::new());
    driver.set_machines(LAB1, &["vm-a", "vm-b"]);
    driver.set_snapshots(LAB1, "vm-a", &["clean"]);
    driver.set_mac_address(LAB1, "vm-a", "080027E852CC");
    driver
}

async fn get(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, serde_json::Value) {
    let response = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, json)
}

#[tokio::test]
async fn lists_hosts_without_secrets() {
    let (status, _, body) = get(app(lab1_driver()), "/api/v1/hosts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!([{"name": "lab1", "url": LAB1, "username": "jenkins"}])
    );
    assert!(!body.to_string().contains("secret"));
}

#[tokio::test]
async fn lists_machines_and_tolerates_unknown_hosts() {
    let (status, _, body) = get(app(lab1_driver()), "/api/v1/hosts/lab1/machines").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!(["vm-a", "vm-b"]));

    let (status, _, body) = get(app(lab1_driver()), "/api/v1/hosts/lab9/machines?cached=true").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn lists_snapshots() {
    let (status, _, body) = get(app(lab1_driver()), "/api/v1/hosts/lab1/machines/vm-a/snapshots").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!(["clean"]));
}

#[tokio::test]
async fn driver_failures_map_to_gateway_errors() {
    let driver = lab1_driver();
    driver.fail(LAB1, DriverError::timeout(LAB1, std::time::Duration::from_secs(30)));
    let (status, _, body) = get(app(driver.clone()), "/api/v1/hosts/lab1/machines").await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"], "driver.timeout");

    driver.fail(LAB1, DriverError::auth(LAB1, "401 Unauthorized"));
    let (status, _, body) = get(app(driver), "/api/v1/hosts/lab1/machines").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "driver.auth");
}

#[tokio::test]
async fn agent_lookup_redirects_by_mac() {
    let (status, headers, _) = get(app(lab1_driver()), "/api/v1/agent?macAddress=080027e852cc").await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(
        headers[header::LOCATION],
        "http://localhost:8080/hudson/computer/virtual/slave-agent.jnlp"
    );

    let (status, _, _) = get(app(lab1_driver()), "/api/v1/agent?macAddress=08:00:27:00:00:00").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, body) = get(app(lab1_driver()), "/api/v1/agent?macAddress=bogus").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_connection_reports_status() {
    let request = |url: &str| {
        Request::post("/api/v1/test-connection")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({"url": url, "username": "jenkins", "password": "pw"}).to_string(),
            ))
            .unwrap()
    };

    let response = app(lab1_driver()).oneshot(request(LAB1)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value =
        serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body, serde_json::json!({"status": "ok"}));

    let response = app(lab1_driver()).oneshot(request("http://nowhere")).await.unwrap();
    let body: serde_json::Value =
        serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("nowhere"));
}

#[tokio::test]
async fn startup_wait_checks() {
    for (value, kind) in [("5", "ok"), ("0", "warning"), ("-1", "error"), ("abc", "error")] {
        let (status, _, body) =
            get(app(lab1_driver()), &format!("/api/v1/checks/startup-wait?value={}", value)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kind"], kind, "value {}", value);
    }
}
