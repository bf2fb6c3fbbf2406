pub mod http;
pub mod memory;
pub mod timeout;

use async_trait::async_trait;

use crate::core::host::HostConnection;
use crate::errors::DriverError;

// exports for lazy devs like us
pub use http::HttpDriver;
pub use memory::InMemoryDriver;
pub use timeout::TimeoutDriver;

/// Remote calls against a hypervisor management endpoint.
///
/// Implementations are stateless per call: everything needed to reach the
/// endpoint travels in the `HostConnection`. Every call may block on the
/// network, so callers must not hold broader locks across them.
#[async_trait]
pub trait VirtualizationDriver: Send + Sync {
    /// Names of all virtual machines the host reports, in the host's order.
    async fn list_machines(&self, conn: &HostConnection) -> Result<Vec<String>, DriverError>;

    /// Snapshot names of one machine, in the host's order.
    async fn list_snapshots(
        &self,
        conn: &HostConnection,
        machine: &str,
    ) -> Result<Vec<String>, DriverError>;

    /// Raw MAC address of the machine's primary network adapter. `None` when
    /// no adapter is configured or the adapter has no address.
    async fn mac_address(
        &self,
        conn: &HostConnection,
        machine: &str,
    ) -> Result<Option<String>, DriverError>;
}
