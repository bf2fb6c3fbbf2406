use futures_util::FutureExt;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::host::{HostConnection, Secret, VirtualizationHost};
use crate::driver::VirtualizationDriver;

/// Name given to the throwaway host a probe talks to.
pub const PROBE_HOST_NAME: &str = "testConnection";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum ConnectionStatus {
    Ok,
    Error(String),
}

impl ConnectionStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, ConnectionStatus::Ok)
    }
}

/// Tries one inventory fetch against an endpoint that is not registered
/// anywhere. Every failure, a panicking driver included, comes back as
/// `ConnectionStatus::Error`; nothing escapes this function.
pub async fn test_connection(
    driver: Arc<dyn VirtualizationDriver>,
    url: &str,
    username: &str,
    secret: Secret,
) -> ConnectionStatus {
    info!(url = %url, username = %username, "Testing connection");
    let host = VirtualizationHost::new(
        PROBE_HOST_NAME,
        HostConnection::new(url, username, secret),
        driver,
    );

    match AssertUnwindSafe(host.refresh()).catch_unwind().await {
        Ok(Ok(machines)) => {
            info!(url = %url, machines = machines.len(), "Connection test succeeded");
            ConnectionStatus::Ok
        }
        Ok(Err(e)) => {
            warn!(url = %url, error = %e, "Connection test failed");
            ConnectionStatus::Error(e.to_string())
        }
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "driver panicked".to_string());
            warn!(url = %url, error = %message, "Connection test aborted");
            ConnectionStatus::Error(message)
        }
    }
}
