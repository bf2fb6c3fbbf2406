use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};

use crate::core::host::VirtualizationHost;
use crate::core::mac::MacAddress;

/// One machine as reported by a host's last inventory refresh.
///
/// Descriptors are rebuilt on every refresh and never mutated. The host link
/// is weak: it is only used to find the host again, it does not keep it alive.
#[derive(Debug, Clone, Serialize)]
pub struct VirtualMachine {
    name: String,
    host_name: String,
    #[serde(skip)]
    host: Weak<VirtualizationHost>,
}

impl VirtualMachine {
    pub fn new(name: impl Into<String>, host: &Arc<VirtualizationHost>) -> Self {
        Self {
            name: name.into(),
            host_name: host.name().to_string(),
            host: Arc::downgrade(host),
        }
    }

    #[cfg(test)]
    pub(crate) fn detached(
        name: impl Into<String>,
        host_name: impl Into<String>,
        host: Weak<VirtualizationHost>,
    ) -> Self {
        Self {
            name: name.into(),
            host_name: host_name.into(),
            host,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    /// The owning host, if it is still registered somewhere.
    pub fn host(&self) -> Option<Arc<VirtualizationHost>> {
        self.host.upgrade()
    }
}

impl PartialEq for VirtualMachine {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.host_name == other.host_name
    }
}

impl Eq for VirtualMachine {}

/// A scheduler node bound to one machine on one host.
///
/// Owned by the scheduler side and handed in per lookup; nothing here keeps
/// these around.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeNode {
    pub name: String,
    pub host_name: String,
    pub virtual_machine_name: String,
    /// Seconds to wait after start before the machine takes work.
    #[serde(default)]
    pub startup_wait_seconds: u64,
    /// Hardware address the node is expected to come up with, if declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<MacAddress>,
}

impl ComputeNode {
    pub fn new(
        name: impl Into<String>,
        host_name: impl Into<String>,
        virtual_machine_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            host_name: host_name.into(),
            virtual_machine_name: virtual_machine_name.into(),
            startup_wait_seconds: 0,
            mac_address: None,
        }
    }

    pub fn with_mac_address(mut self, mac: MacAddress) -> Self {
        self.mac_address = Some(mac);
        self
    }

    pub fn with_startup_wait(mut self, seconds: u64) -> Self {
        self.startup_wait_seconds = seconds;
        self
    }
}
