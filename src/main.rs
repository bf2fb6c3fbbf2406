use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();
    info!("Starting VM Fleet Manager");

    vm_fleet_manager::cli::run().await
}
