use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::core::host::HostConnection;
use crate::driver::VirtualizationDriver;
use crate::errors::DriverError;

/// Puts an upper bound on every call of the wrapped driver.
///
/// A call that overruns is abandoned and reported as a `Timeout` driver
/// error, so callers on hot paths (agent lookup by MAC) fail fast instead of
/// hanging on one dead host.
pub struct TimeoutDriver {
    inner: Arc<dyn VirtualizationDriver>,
    limit: Duration,
}

impl TimeoutDriver {
    pub fn new(inner: Arc<dyn VirtualizationDriver>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    async fn bounded<T>(
        &self,
        conn: &HostConnection,
        call: &str,
        fut: impl Future<Output = Result<T, DriverError>>,
    ) -> Result<T, DriverError> {
        match tokio::time::timeout(self.limit, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(url = %conn.url, call = %call, limit_ms = self.limit.as_millis() as u64, "Driver call timed out");
                Err(DriverError::timeout(&conn.url, self.limit))
            }
        }
    }
}

#[async_trait]
impl VirtualizationDriver for TimeoutDriver {
    async fn list_machines(&self, conn: &HostConnection) -> Result<Vec<String>, DriverError> {
        self.bounded(conn, "list_machines", self.inner.list_machines(conn))
            .await
    }

    async fn list_snapshots(
        &self,
        conn: &HostConnection,
        machine: &str,
    ) -> Result<Vec<String>, DriverError> {
        self.bounded(conn, "list_snapshots", self.inner.list_snapshots(conn, machine))
            .await
    }

    async fn mac_address(
        &self,
        conn: &HostConnection,
        machine: &str,
    ) -> Result<Option<String>, DriverError> {
        self.bounded(conn, "mac_address", self.inner.mac_address(conn, machine))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::host::Secret;
    use crate::driver::InMemoryDriver;
    use crate::errors::DriverFailure;

    #[tokio::test]
    async fn slow_calls_turn_into_timeouts() {
        let slow = Arc::new(InMemoryDriver::new());
        slow.set_machines("http://lab1", &["vm-a"]);
        slow.set_delay(Some(Duration::from_secs(5)));

        let driver = TimeoutDriver::new(slow.clone(), Duration::from_millis(50));
        let conn = HostConnection::new("http://lab1", "jenkins", Secret::default());

        let err = driver.list_machines(&conn).await.unwrap_err();
        assert_eq!(err.reason, DriverFailure::Timeout);
        assert_eq!(err.endpoint, "http://lab1");
    }

    #[tokio::test]
    async fn fast_calls_pass_through() {
        let inner = Arc::new(InMemoryDriver::new());
        inner.set_machines("http://lab1", &["vm-a", "vm-b"]);
        inner.set_mac_address("http://lab1", "vm-a", "080027E852CC");

        let driver = TimeoutDriver::new(inner, Duration::from_secs(1));
        let conn = HostConnection::new("http://lab1", "jenkins", Secret::default());

        assert_eq!(driver.list_machines(&conn).await.unwrap(), vec!["vm-a", "vm-b"]);
        assert_eq!(
            driver.mac_address(&conn, "vm-a").await.unwrap().as_deref(),
            Some("080027E852CC")
        );
    }

    #[tokio::test]
    async fn errors_are_not_rewritten() {
        let inner = Arc::new(InMemoryDriver::new());
        inner.set_machines("http://lab1", &[]);
        inner.fail("http://lab1", DriverError::auth("http://lab1", "401 Unauthorized"));

        let driver = TimeoutDriver::new(inner, Duration::from_secs(1));
        let conn = HostConnection::new("http://lab1", "jenkins", Secret::default());
        let err = driver.list_snapshots(&conn, "vm-a").await.unwrap_err();
        assert_eq!(err.reason, DriverFailure::Auth);
    }
}
