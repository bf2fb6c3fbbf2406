/*
* Fleet Manager API Routes
* ------------------------
* Thin HTTP surface over the host registry. Every handler is a lookup; the
* real work (inventory caching, MAC scans) lives in `crate::core`.
*
* GET  /api/v1/hosts                                 - registered hosts
* GET  /api/v1/hosts/{host}/machines[?cached=true]   - machine names on a host
* GET  /api/v1/hosts/{host}/machines/{vm}/snapshots  - snapshot names of a machine
* GET  /api/v1/agent?macAddress=080027E852CC         - 302 a booting machine to its agent URL
* POST /api/v1/test-connection                       - probe an endpoint without registering it
* GET  /api/v1/checks/startup-wait?value=10          - validate a ready-wait value
*
* Unknown hosts are not errors here: they list as empty, same as a fresh
* install with nothing configured.
*/

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::agent::AgentUrlPublisher;
use crate::api::error::ApiError;
use crate::core::{
    test_connection as probe_connection, validate_startup_wait, ComputeNode, ConnectionStatus,
    HostRegistry, MacAddress, Secret, StartupWaitCheck,
};
use crate::driver::VirtualizationDriver;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<HostRegistry>,
    pub nodes: Arc<Vec<ComputeNode>>,
    pub driver: Arc<dyn VirtualizationDriver>,
    pub publisher: Arc<dyn AgentUrlPublisher>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HostResponse {
    pub name: String,
    pub url: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct MachinesQuery {
    #[serde(default)]
    pub cached: bool,
}

#[derive(Debug, Deserialize)]
pub struct AgentQuery {
    #[serde(rename = "macAddress")]
    pub mac_address: String,
}

#[derive(Debug, Deserialize)]
pub struct TestConnectionRequest {
    pub url: String,
    pub username: String,
    #[serde(default)]
    pub password: Secret,
}

#[derive(Debug, Deserialize)]
pub struct StartupWaitQuery {
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckResponse {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/v1/hosts", get(list_hosts))
        .route("/api/v1/hosts/{host}/machines", get(list_machines))
        .route("/api/v1/hosts/{host}/machines/{vm}/snapshots", get(list_snapshots))
        .route("/api/v1/agent", get(agent_redirect))
        .route("/api/v1/test-connection", post(test_connection))
        .route("/api/v1/checks/startup-wait", get(check_startup_wait))
        .with_state(app_state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(64 * 1024)),
        )
}

async fn list_hosts(State(state): State<AppState>) -> Json<Vec<HostResponse>> {
    Json(
        state
            .registry
            .list_hosts()
            .iter()
            .map(|h| HostResponse {
                name: h.name().to_string(),
                url: h.connection().url.clone(),
                username: h.connection().username.clone(),
            })
            .collect(),
    )
}

async fn list_machines(
    State(state): State<AppState>,
    Path(host): Path<String>,
    Query(query): Query<MachinesQuery>,
) -> Result<Json<Vec<String>>, ApiError> {
    let machines = if query.cached {
        state.registry.cached_for_host(&host).await?
    } else {
        state.registry.list_for_host(&host).await?
    };
    Ok(Json(machines.iter().map(|m| m.name().to_string()).collect()))
}

async fn list_snapshots(
    State(state): State<AppState>,
    Path((host, vm)): Path<(String, String)>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.registry.list_snapshots(&host, &vm).await?))
}

async fn agent_redirect(
    State(state): State<AppState>,
    Query(query): Query<AgentQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mac: MacAddress = query
        .mac_address
        .parse()
        .map_err(|e: crate::core::mac::InvalidMacAddress| ApiError::BadRequest(e.to_string()))?;

    info!(mac = %mac, "Searching virtual machine with MAC address");
    let scan = state.registry.scan_nodes_by_mac(&state.nodes, &mac).await;
    let Some(node) = scan.matched else {
        if !scan.failures.is_empty() {
            warn!(mac = %mac, failed = scan.failures.len(), "Some nodes could not be checked");
        }
        return Err(ApiError::NotFound(format!("No compute node has MAC address {}", mac)));
    };

    let url = state.publisher.agent_url(&node.name).ok_or_else(|| {
        ApiError::NotFound(format!("No agent URL for node {}", node.name))
    })?;
    info!(node = %node.name, mac = %mac, url = %url, "Redirecting agent");
    Ok((StatusCode::FOUND, [(header::LOCATION, url)]))
}

async fn test_connection(
    State(state): State<AppState>,
    Json(request): Json<TestConnectionRequest>,
) -> Json<ConnectionStatus> {
    Json(probe_connection(state.driver.clone(), &request.url, &request.username, request.password).await)
}

async fn check_startup_wait(Query(query): Query<StartupWaitQuery>) -> Json<CheckResponse> {
    let response = match validate_startup_wait(&query.value) {
        Ok(StartupWaitCheck::Ok) => CheckResponse {
            kind: "ok".to_string(),
            message: None,
        },
        Ok(StartupWaitCheck::Warning(message)) => CheckResponse {
            kind: "warning".to_string(),
            message: Some(message),
        },
        Err(e) => CheckResponse {
            kind: "error".to_string(),
            message: Some(e.to_string()),
        },
    };
    Json(response)
}
