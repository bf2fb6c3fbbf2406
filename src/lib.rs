pub mod agent;
pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod driver;
pub mod errors;

// Re-exports
pub use crate::api::{create_router, AppState};
pub use crate::core::{ComputeNode, HostRegistry, MacAddress, VirtualMachine, VirtualizationHost};
pub use crate::driver::VirtualizationDriver;
pub use crate::errors::{DriverError, DriverFailure, FleetError, FleetResult, ValidationError};
pub type AsyncMutex<T> = tokio::sync::Mutex<T>;
