use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

use crate::core::host::VirtualizationHost;

/// The set of virtualization hosts known to this process.
///
/// Owned by whoever wires the application together and passed by reference
/// into every lookup. Hosts are kept in registration order and looked up by
/// exact, case-sensitive display name.
///
/// Precondition: display names are unique. This is not enforced; registering
/// a second host under an existing name logs a warning and the earlier one
/// keeps winning lookups.
#[derive(Debug, Default)]
pub struct HostRegistry {
    hosts: RwLock<Vec<Arc<VirtualizationHost>>>,
}

impl HostRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a host. Never talks to the host: a briefly unreachable endpoint
    /// must not make registration fail.
    pub fn register_host(&self, host: Arc<VirtualizationHost>) {
        let mut hosts = self.hosts.write().unwrap_or_else(PoisonError::into_inner);
        if hosts.iter().any(|h| h.name() == host.name()) {
            warn!(host = %host.name(), "Registering a host whose name is already taken");
        }
        info!(host = %host.name(), url = %host.connection().url, "Registered virtualization host");
        hosts.push(host);
    }

    /// Removes the first host with this name and hands it back.
    pub fn deregister_host(&self, name: &str) -> Option<Arc<VirtualizationHost>> {
        let mut hosts = self.hosts.write().unwrap_or_else(PoisonError::into_inner);
        let index = hosts.iter().position(|h| h.name() == name)?;
        info!(host = %name, "Deregistered virtualization host");
        Some(hosts.remove(index))
    }

    /// First host whose display name equals `name`. Absence is a normal
    /// outcome, e.g. a node still pointing at a host that was removed.
    pub fn find_host(&self, name: &str) -> Option<Arc<VirtualizationHost>> {
        if name.is_empty() {
            return None;
        }
        self.hosts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|h| h.name() == name)
            .cloned()
    }

    /// Snapshot of the current registrations, in registration order.
    pub fn list_hosts(&self) -> Vec<Arc<VirtualizationHost>> {
        self.hosts.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn len(&self) -> usize {
        self.hosts.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::host::{HostConnection, Secret};
    use crate::driver::InMemoryDriver;

    fn host(name: &str, driver: &Arc<InMemoryDriver>) -> Arc<VirtualizationHost> {
        VirtualizationHost::new(
            name,
            HostConnection::new(format!("http://{}:18083", name), "jenkins", Secret::new("pw")),
            driver.clone(),
        )
    }

    #[test]
    fn lookup_is_exact_and_case_sensitive() {
        let driver = Arc::new(InMemoryDriver::new());
        let registry = HostRegistry::new();
        registry.register_host(host("lab1", &driver));
        registry.register_host(host("lab2", &driver));

        assert_eq!(registry.find_host("lab1").unwrap().name(), "lab1");
        assert_eq!(registry.find_host("lab2").unwrap().name(), "lab2");
        assert!(registry.find_host("LAB1").is_none());
        assert!(registry.find_host("lab").is_none());
        assert!(registry.find_host("").is_none());
    }

    #[test]
    fn registration_order_is_kept() {
        let driver = Arc::new(InMemoryDriver::new());
        let registry = HostRegistry::new();
        for name in ["c", "a", "b"] {
            registry.register_host(host(name, &driver));
        }
        let names: Vec<_> = registry.list_hosts().iter().map(|h| h.name().to_string()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
        assert_eq!(driver.list_calls(), 0, "registration must stay offline");
    }

    #[test]
    fn duplicate_names_resolve_to_the_first() {
        let driver = Arc::new(InMemoryDriver::new());
        let registry = HostRegistry::new();
        let first = host("lab1", &driver);
        registry.register_host(first.clone());
        registry.register_host(host("lab1", &driver));
        assert!(Arc::ptr_eq(&registry.find_host("lab1").unwrap(), &first));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn deregistering_replaces_nothing_else() {
        let driver = Arc::new(InMemoryDriver::new());
        let registry = HostRegistry::new();
        registry.register_host(host("lab1", &driver));
        registry.register_host(host("lab2", &driver));

        let removed = registry.deregister_host("lab1").unwrap();
        assert_eq!(removed.name(), "lab1");
        assert!(registry.find_host("lab1").is_none());
        assert!(registry.find_host("lab2").is_some());
        assert!(registry.deregister_host("lab1").is_none());
    }
}
