use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::inventory::{Inventory, InventorySnapshot};
use crate::core::vm::VirtualMachine;
use crate::driver::VirtualizationDriver;
use crate::errors::DriverError;

/// Credential that never shows up in logs or Debug output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(****)")
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Where a host's management endpoint lives and how to log in to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConnection {
    pub url: String,
    pub username: String,
    pub secret: Secret,
}

impl HostConnection {
    pub fn new(url: impl Into<String>, username: impl Into<String>, secret: Secret) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            secret,
        }
    }
}

/// A configured virtualization endpoint.
///
/// Immutable once built: reconfiguring a host means registering a new value
/// and dropping the old one. Each host owns exactly one inventory cache and
/// the cache lives as long as the host does.
pub struct VirtualizationHost {
    name: String,
    connection: HostConnection,
    driver: Arc<dyn VirtualizationDriver>,
    inventory: Inventory,
}

impl VirtualizationHost {
    /// Builds a host without touching the network. Connectivity is only
    /// exercised on first inventory access.
    pub fn new(
        name: impl Into<String>,
        connection: HostConnection,
        driver: Arc<dyn VirtualizationDriver>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            connection,
            driver,
            inventory: Inventory::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn connection(&self) -> &HostConnection {
        &self.connection
    }

    pub(crate) fn driver(&self) -> &dyn VirtualizationDriver {
        self.driver.as_ref()
    }

    /// Re-enumerates the host and atomically replaces the cached list. On
    /// failure the previous list (if any) stays in place.
    pub async fn refresh(self: &Arc<Self>) -> Result<Arc<Vec<VirtualMachine>>, DriverError> {
        let machines = self.inventory.refresh(move || self.enumerate()).await?;
        info!(host = %self.name, machines = machines.len(), "Refreshed virtual machine list");
        Ok(machines)
    }

    /// Cached machine list, enumerating the host first if nothing is cached yet.
    pub async fn machines(self: &Arc<Self>) -> Result<Arc<Vec<VirtualMachine>>, DriverError> {
        self.inventory.get(move || self.enumerate()).await
    }

    /// Looks into the cache without ever calling the driver.
    pub async fn cached(&self) -> Option<InventorySnapshot> {
        self.inventory.cached().await
    }

    /// First machine called `machine_name`, in inventory order.
    pub async fn machine(
        self: &Arc<Self>,
        machine_name: &str,
    ) -> Result<Option<VirtualMachine>, DriverError> {
        let machines = self.machines().await?;
        Ok(machines.iter().find(|m| m.name() == machine_name).cloned())
    }

    /// Snapshot names straight from the driver; these are never cached.
    pub async fn snapshots(&self, machine_name: &str) -> Result<Vec<String>, DriverError> {
        self.driver.list_snapshots(&self.connection, machine_name).await
    }

    async fn enumerate(self: &Arc<Self>) -> Result<Vec<VirtualMachine>, DriverError> {
        debug!(host = %self.name, url = %self.connection.url, "Enumerating virtual machines");
        let names = self.driver.list_machines(&self.connection).await?;
        Ok(names
            .into_iter()
            .map(|name| VirtualMachine::new(name, self))
            .collect())
    }
}

impl fmt::Debug for VirtualizationHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualizationHost")
            .field("name", &self.name)
            .field("url", &self.connection.url)
            .field("username", &self.connection.username)
            .finish()
    }
}
