use std::sync::Arc;
use tracing::debug;

use crate::core::registry::HostRegistry;
use crate::core::vm::VirtualMachine;
use crate::errors::DriverError;

// Lookups that go from names to machines. No state of their own: everything
// is host lookup plus the host's inventory plus a first-match scan.
impl HostRegistry {
    /// The machine `vm_name` on host `host_name`, or `None` when the host is
    /// not registered, the name is empty, or the inventory has no such machine.
    /// The host's inventory is populated on first use.
    pub async fn resolve(
        &self,
        host_name: &str,
        vm_name: &str,
    ) -> Result<Option<VirtualMachine>, DriverError> {
        if vm_name.is_empty() {
            return Ok(None);
        }
        let Some(host) = self.find_host(host_name) else {
            debug!(host = %host_name, machine = %vm_name, "Unknown host while resolving machine");
            return Ok(None);
        };
        host.machine(vm_name).await
    }

    /// Fresh machine list for a host. An unknown host is not an error, it is
    /// just a host with nothing configured yet.
    pub async fn list_for_host(
        &self,
        host_name: &str,
    ) -> Result<Arc<Vec<VirtualMachine>>, DriverError> {
        match self.find_host(host_name) {
            Some(host) => host.refresh().await,
            None => Ok(Arc::new(Vec::new())),
        }
    }

    /// Like `list_for_host`, but served from the cache when one exists.
    pub async fn cached_for_host(
        &self,
        host_name: &str,
    ) -> Result<Arc<Vec<VirtualMachine>>, DriverError> {
        match self.find_host(host_name) {
            Some(host) => host.machines().await,
            None => Ok(Arc::new(Vec::new())),
        }
    }

    /// Snapshot names of a machine, fetched on every call.
    pub async fn list_snapshots(
        &self,
        host_name: &str,
        vm_name: &str,
    ) -> Result<Vec<String>, DriverError> {
        match self.find_host(host_name) {
            Some(host) => host.snapshots(vm_name).await,
            None => Ok(Vec::new()),
        }
    }
}
