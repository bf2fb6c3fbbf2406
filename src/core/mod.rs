pub mod binding;
pub mod host;
pub mod inventory;
pub mod mac;
pub mod probe;
pub mod registry;
pub mod resolver;
pub mod validation;
pub mod vm;

// exports for lazy devs like us
pub use binding::{IdentityCheck, MacScan, NodeFailure};
pub use host::{HostConnection, Secret, VirtualizationHost};
pub use inventory::{Inventory, InventorySnapshot};
pub use mac::MacAddress;
pub use probe::{test_connection, ConnectionStatus};
pub use registry::HostRegistry;
pub use validation::{validate_startup_wait, StartupWaitCheck};
pub use vm::{ComputeNode, VirtualMachine};
