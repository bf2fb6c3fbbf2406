use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::core::host::HostConnection;
use crate::driver::VirtualizationDriver;
use crate::errors::DriverError;

#[derive(Debug, Default)]
struct Endpoint {
    machines: Vec<String>,
    snapshots: HashMap<String, Vec<String>>,
    macs: HashMap<String, String>,
    failure: Option<DriverError>,
}

/// Driver backed by in-process tables, keyed by endpoint URL.
///
/// Stands in for a real hypervisor in tests and dry runs. Counts every call,
/// can be told to fail a given endpoint, to answer slowly, or to panic.
#[derive(Debug, Default)]
pub struct InMemoryDriver {
    endpoints: Mutex<HashMap<String, Endpoint>>,
    delay: Mutex<Option<Duration>>,
    panic_message: Mutex<Option<String>>,
    list_calls: AtomicUsize,
    snapshot_calls: AtomicUsize,
    mac_calls: AtomicUsize,
}

impl InMemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_machines(&self, url: &str, names: &[&str]) {
        self.with_endpoint(url, |e| e.machines = names.iter().map(|n| n.to_string()).collect());
    }

    pub fn set_snapshots(&self, url: &str, machine: &str, names: &[&str]) {
        self.with_endpoint(url, |e| {
            e.snapshots
                .insert(machine.to_string(), names.iter().map(|n| n.to_string()).collect());
        });
    }

    pub fn set_mac_address(&self, url: &str, machine: &str, mac: &str) {
        self.with_endpoint(url, |e| {
            e.macs.insert(machine.to_string(), mac.to_string());
        });
    }

    /// Every call against `url` fails with `error` until `heal` is called.
    pub fn fail(&self, url: &str, error: DriverError) {
        self.with_endpoint(url, |e| e.failure = Some(error));
    }

    pub fn heal(&self, url: &str) {
        self.with_endpoint(url, |e| e.failure = None);
    }

    /// Makes every call sleep before answering.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap_or_else(PoisonError::into_inner) = delay;
    }

    /// Makes every call panic with `message`.
    pub fn set_panic(&self, message: Option<&str>) {
        *self.panic_message.lock().unwrap_or_else(PoisonError::into_inner) =
            message.map(str::to_string);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn snapshot_calls(&self) -> usize {
        self.snapshot_calls.load(Ordering::SeqCst)
    }

    pub fn mac_calls(&self) -> usize {
        self.mac_calls.load(Ordering::SeqCst)
    }

    fn with_endpoint(&self, url: &str, f: impl FnOnce(&mut Endpoint)) {
        let mut endpoints = self.endpoints.lock().unwrap_or_else(PoisonError::into_inner);
        f(endpoints.entry(url.to_string()).or_default());
    }

    /// Applies the configured delay/panic, then reads the endpoint table.
    async fn answer<T>(
        &self,
        conn: &HostConnection,
        read: impl FnOnce(&Endpoint) -> T,
    ) -> Result<T, DriverError> {
        let delay = *self.delay.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let panic_message = self
            .panic_message
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(message) = panic_message {
            panic!("{}", message);
        }

        let endpoints = self.endpoints.lock().unwrap_or_else(PoisonError::into_inner);
        let endpoint = endpoints
            .get(&conn.url)
            .ok_or_else(|| DriverError::unreachable(&conn.url, "no such endpoint"))?;
        if let Some(failure) = &endpoint.failure {
            return Err(failure.clone());
        }
        Ok(read(endpoint))
    }
}

#[async_trait]
impl VirtualizationDriver for InMemoryDriver {
    async fn list_machines(&self, conn: &HostConnection) -> Result<Vec<String>, DriverError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(conn, |e| e.machines.clone()).await
    }

    async fn list_snapshots(
        &self,
        conn: &HostConnection,
        machine: &str,
    ) -> Result<Vec<String>, DriverError> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(conn, |e| e.snapshots.get(machine).cloned().unwrap_or_default())
            .await
    }

    async fn mac_address(
        &self,
        conn: &HostConnection,
        machine: &str,
    ) -> Result<Option<String>, DriverError> {
        self.mac_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(conn, |e| e.macs.get(machine).cloned()).await
    }
}
