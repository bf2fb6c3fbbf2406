use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hyper::client::HttpConnector;
use hyper::header::{ACCEPT, AUTHORIZATION};
use hyper::{Body, Client, Method, Request, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::core::host::HostConnection;
use crate::driver::VirtualizationDriver;
use crate::errors::DriverError;

#[derive(Debug, Deserialize)]
struct MachineEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SnapshotEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdapterEntry {
    slot: u32,
    #[serde(default = "enabled_by_default")]
    enabled: bool,
    #[serde(default)]
    mac_address: Option<String>,
}

fn enabled_by_default() -> bool {
    true
}

/// Talks JSON over plain HTTP to a hypervisor management endpoint.
///
/// Resources, relative to the host URL:
///
/// * `GET machines` -> `[{"name": "vm-a"}, ...]`
/// * `GET machines/{vm}/snapshots` -> `[{"name": "clean"}, ...]`
/// * `GET machines/{vm}/network-adapters` -> `[{"slot": 0, "enabled": true, "macAddress": "080027E852CC"}]`
///
/// Credentials go out as HTTP Basic auth on every request. Only `http://`
/// host URLs are supported; any other scheme fails as unreachable before a
/// request is made. No timeouts here; wrap the driver in a `TimeoutDriver`.
#[derive(Clone)]
pub struct HttpDriver {
    client: Client<HttpConnector>,
}

impl Default for HttpDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpDriver {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        conn: &HostConnection,
        segments: &[&str],
    ) -> Result<Option<T>, DriverError> {
        let url = resource_url(&conn.url, segments)?;
        debug!(url = %url, "GET");

        let credentials = STANDARD.encode(format!("{}:{}", conn.username, conn.secret.expose()));
        let request = Request::builder()
            .method(Method::GET)
            .uri(url.as_str())
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, format!("Basic {}", credentials))
            .body(Body::empty())
            .map_err(|e| DriverError::unreachable(&conn.url, e.to_string()))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| DriverError::unreachable(&conn.url, e.to_string()))?;

        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(DriverError::auth(&conn.url, status.to_string()))
            }
            StatusCode::NOT_FOUND => return Ok(None),
            s if s.is_server_error() => {
                return Err(DriverError::unreachable(&conn.url, s.to_string()))
            }
            s if !s.is_success() => {
                return Err(DriverError::malformed(
                    &conn.url,
                    format!("unexpected status {}", s),
                ))
            }
            _ => {}
        }

        let body = hyper::body::to_bytes(response.into_body())
            .await
            .map_err(|e| DriverError::unreachable(&conn.url, e.to_string()))?;
        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|e| DriverError::malformed(&conn.url, e.to_string()))
    }
}

/// Appends path segments to the host URL, percent-encoding each one.
fn resource_url(base: &str, segments: &[&str]) -> Result<Url, DriverError> {
    let mut url = Url::parse(base).map_err(|e| DriverError::unreachable(base, e.to_string()))?;
    if url.scheme() != "http" {
        return Err(DriverError::unreachable(
            base,
            format!("unsupported scheme '{}', only http:// hosts are supported", url.scheme()),
        ));
    }
    url.path_segments_mut()
        .map_err(|_| DriverError::unreachable(base, "URL cannot carry a path"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Address of the lowest-slot enabled adapter that has one.
fn primary_mac(mut adapters: Vec<AdapterEntry>) -> Option<String> {
    adapters.sort_by_key(|a| a.slot);
    adapters
        .into_iter()
        .filter(|a| a.enabled)
        .find_map(|a| a.mac_address.filter(|m| !m.trim().is_empty()))
}

#[async_trait]
impl VirtualizationDriver for HttpDriver {
    async fn list_machines(&self, conn: &HostConnection) -> Result<Vec<String>, DriverError> {
        let machines: Vec<MachineEntry> = self
            .get_json(conn, &["machines"])
            .await?
            .ok_or_else(|| DriverError::malformed(&conn.url, "machines resource not found"))?;
        Ok(machines.into_iter().map(|m| m.name).collect())
    }

    async fn list_snapshots(
        &self,
        conn: &HostConnection,
        machine: &str,
    ) -> Result<Vec<String>, DriverError> {
        let snapshots: Option<Vec<SnapshotEntry>> = self
            .get_json(conn, &["machines", machine, "snapshots"])
            .await?;
        Ok(snapshots
            .unwrap_or_default()
            .into_iter()
            .map(|s| s.name)
            .collect())
    }

    async fn mac_address(
        &self,
        conn: &HostConnection,
        machine: &str,
    ) -> Result<Option<String>, DriverError> {
        let adapters: Option<Vec<AdapterEntry>> = self
            .get_json(conn, &["machines", machine, "network-adapters"])
            .await?;
        Ok(adapters.and_then(primary_mac))
    }
}
