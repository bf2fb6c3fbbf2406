use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;

use crate::core::vm::VirtualMachine;
use crate::errors::DriverError;
use crate::AsyncMutex;

/// One fully-formed machine list and the moment it was fetched.
#[derive(Debug, Clone)]
pub struct InventorySnapshot {
    pub machines: Arc<Vec<VirtualMachine>>,
    pub refreshed_at: DateTime<Utc>,
}

/// Per-host machine list cache.
///
/// Starts empty and is only ever filled by a refresh, either explicit or
/// triggered by the first read. There is no expiry. A refresh swaps the whole
/// list in one step, so readers see either the previous list or the new one.
///
/// Reads and refreshes on the same cache take the same lock, which is held
/// across the remote call. Two hosts never share a lock.
#[derive(Debug, Default)]
pub struct Inventory {
    state: AsyncMutex<Option<InventorySnapshot>>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn refresh<F, Fut>(&self, fetch: F) -> Result<Arc<Vec<VirtualMachine>>, DriverError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<VirtualMachine>, DriverError>>,
    {
        let mut state = self.state.lock().await;
        let machines = Arc::new(fetch().await?);
        *state = Some(InventorySnapshot {
            machines: machines.clone(),
            refreshed_at: Utc::now(),
        });
        Ok(machines)
    }

    pub async fn get<F, Fut>(&self, fetch: F) -> Result<Arc<Vec<VirtualMachine>>, DriverError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<VirtualMachine>, DriverError>>,
    {
        let mut state = self.state.lock().await;
        if let Some(snapshot) = state.as_ref() {
            return Ok(snapshot.machines.clone());
        }
        let machines = Arc::new(fetch().await?);
        *state = Some(InventorySnapshot {
            machines: machines.clone(),
            refreshed_at: Utc::now(),
        });
        Ok(machines)
    }

    pub async fn cached(&self) -> Option<InventorySnapshot> {
        self.state.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Weak;

    fn machines(names: &[&str]) -> Vec<VirtualMachine> {
        names
            .iter()
            .map(|n| VirtualMachine::detached(*n, "lab1", Weak::new()))
            .collect()
    }

    #[tokio::test]
    async fn get_populates_once() {
        let inventory = Inventory::new();
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let fetch = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(machines(&["vm-a"]))
        };

        inventory.get(fetch).await.unwrap();
        inventory.get(fetch).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_list() {
        let inventory = Inventory::new();
        inventory
            .refresh(|| async { Ok(machines(&["vm-a", "vm-b"])) })
            .await
            .unwrap();

        let err = inventory
            .refresh(|| async { Err(DriverError::unreachable("http://lab1", "connection refused")) })
            .await
            .unwrap_err();
        assert_eq!(err.reason, crate::errors::DriverFailure::Unreachable);

        let cached = inventory.cached().await.expect("previous list survives");
        let names: Vec<_> = cached.machines.iter().map(|m| m.name().to_string()).collect();
        assert_eq!(names, vec!["vm-a", "vm-b"]);
    }

    #[tokio::test]
    async fn failed_first_read_stays_empty() {
        let inventory = Inventory::new();
        let result = inventory
            .get(|| async { Err(DriverError::auth("http://lab1", "401")) })
            .await;
        assert!(result.is_err());
        assert!(inventory.cached().await.is_none());
    }
}
