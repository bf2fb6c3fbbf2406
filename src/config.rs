pub mod settings;

pub use settings::{
    generate_default_config, DriverSettings, HostSettings, ServerSettings, Settings,
};
