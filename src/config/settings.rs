/*
* Fleet Manager Configuration
* ---------------------------
* Layered settings, lowest priority first:
*
* 1. Hardcoded defaults
* 2. $CONFIG_PATH/default.toml (base configuration)
* 3. $CONFIG_PATH/local.toml (machine-specific overrides)
* 4. Environment variables, e.g. FLEET_SERVER__PORT=8081
*
* Sections:
* - server: where the HTTP API listens and the root URL agents are sent to
* - driver: bound on every hypervisor call
* - hosts: virtualization endpoints (name, url, username, password)
* - nodes: compute nodes bound to a machine on one of those hosts
*
* Host persistence belongs to whoever writes these files; the fleet only
* ever reads them.
*/

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::core::{ComputeNode, HostConnection, HostRegistry, Secret, VirtualizationHost};
use crate::driver::{TimeoutDriver, VirtualizationDriver};

#[derive(Debug, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub driver: DriverSettings,
    #[serde(default)]
    pub hosts: Vec<HostSettings>,
    #[serde(default)]
    pub nodes: Vec<ComputeNode>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Public root URL agents are redirected under.
    pub root_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DriverSettings {
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostSettings {
    pub name: String,
    pub url: String,
    pub username: String,
    #[serde(default)]
    pub password: Secret,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config_path = std::env::var("CONFIG_PATH")
            .unwrap_or_else(|_| "config".to_string());

        info!("Loading configuration from path: {}", config_path);

        Self::builder()?
            .add_source(File::with_name(&format!("{}/default", config_path)).required(false))
            .add_source(File::with_name(&format!("{}/local", config_path)).required(false))
            .add_source(Self::environment())
            .build()?
            .try_deserialize()
    }

    pub fn new_from_file(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading configuration from file: {}", path.display());

        Self::builder()?
            .add_source(File::from(path))
            .add_source(Self::environment())
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let defaults = generate_default_config();
        Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", defaults.server.port as i64)?
            .set_default("server.root_url", defaults.server.root_url)?
            .set_default("driver.timeout_secs", defaults.driver.timeout_secs as i64)
    }

    fn environment() -> Environment {
        Environment::with_prefix("FLEET")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    pub fn driver_timeout(&self) -> Duration {
        Duration::from_secs(self.driver.timeout_secs)
    }

    /// Wraps `driver` so every call gives up after `driver.timeout_secs`.
    pub fn bounded_driver(&self, driver: Arc<dyn VirtualizationDriver>) -> Arc<dyn VirtualizationDriver> {
        Arc::new(TimeoutDriver::new(driver, self.driver_timeout()))
    }

    /// Builds a registry holding every configured host, each talking through
    /// a time-bounded `driver`. Nothing is contacted.
    pub fn build_registry(&self, driver: Arc<dyn VirtualizationDriver>) -> HostRegistry {
        let driver = self.bounded_driver(driver);
        let registry = HostRegistry::new();
        for host in &self.hosts {
            registry.register_host(host.to_host(driver.clone()));
        }
        registry
    }
}

impl HostSettings {
    pub fn to_host(&self, driver: Arc<dyn VirtualizationDriver>) -> Arc<VirtualizationHost> {
        VirtualizationHost::new(
            self.name.clone(),
            HostConnection::new(self.url.clone(), self.username.clone(), self.password.clone()),
            driver,
        )
    }
}

pub fn generate_default_config() -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 3000,
            root_url: "http://localhost:8080".to_string(),
        },
        driver: DriverSettings::default(),
        hosts: vec![HostSettings {
            name: "lab1".to_string(),
            url: "http://127.0.0.1:18083".to_string(),
            username: "jenkins".to_string(),
            password: Secret::default(),
        }],
        nodes: vec![ComputeNode::new("virtual", "lab1", "vm-a").with_startup_wait(10)],
    }
}
