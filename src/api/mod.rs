pub mod error;
pub mod routes;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use crate::agent::JnlpAgentPublisher;
use crate::config::Settings;
use crate::driver::VirtualizationDriver;

pub use routes::{create_router, AppState};

impl AppState {
    /// State for a server using `driver`, bounded by the configured timeout.
    pub fn from_settings(settings: &Settings, driver: Arc<dyn VirtualizationDriver>) -> Self {
        Self {
            registry: Arc::new(settings.build_registry(driver.clone())),
            nodes: Arc::new(settings.nodes.clone()),
            driver: settings.bounded_driver(driver),
            publisher: Arc::new(JnlpAgentPublisher::new(settings.server.root_url.clone())),
        }
    }
}

pub async fn run_server(settings: &Settings, port: u16, driver: Arc<dyn VirtualizationDriver>) -> Result<()> {
    let state = AppState::from_settings(settings, driver);
    info!(
        hosts = state.registry.len(),
        nodes = state.nodes.len(),
        "Fleet state ready"
    );
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
