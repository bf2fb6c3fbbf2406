/*
* Fleet Manager Command Line Interface
* ------------------------------------
* vm-fleet-manager
* ├── serve [--port]                      // HTTP API
* ├── hosts                               // registered hosts
* ├── machines --host <H> [--cached]      // machines on a host
* ├── snapshots --host <H> --vm <VM>      // snapshots of a machine
* ├── find-node --mac <MAC>               // which node owns this MAC?
* ├── verify                              // declared MACs vs. what the hosts report
* ├── test-connection --url --username    // probe an endpoint, register nothing
* ├── check-wait <SECONDS>                // validate a ready-wait value
* └── init [--force]                      // write config/default.toml
*/

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::core::{
    test_connection, validate_startup_wait, ConnectionStatus, HostRegistry, IdentityCheck,
    MacAddress, Secret, StartupWaitCheck,
};
use crate::driver::{HttpDriver, VirtualizationDriver};

#[derive(Parser)]
#[command(name = "vm-fleet-manager")]
#[command(about = "Virtual machine fleet controller", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// List registered virtualization hosts
    Hosts,
    /// List the virtual machines of a host
    Machines {
        #[arg(long)]
        host: String,
        /// Serve from the inventory cache when possible
        #[arg(long)]
        cached: bool,
    },
    /// List the snapshots of a virtual machine
    Snapshots {
        #[arg(long)]
        host: String,
        #[arg(long)]
        vm: String,
    },
    /// Find the compute node whose machine has this MAC address
    FindNode {
        #[arg(long)]
        mac: String,
    },
    /// Check every node's declared MAC address against its machine
    Verify,
    /// Try to reach a host without registering it
    TestConnection {
        #[arg(long)]
        url: String,
        #[arg(long)]
        username: String,
        #[arg(long, default_value = "")]
        password: String,
    },
    /// Validate a ready-wait duration in seconds
    CheckWait {
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Generate default configuration
    Init {
        #[arg(short, long)]
        force: bool,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init { force } = cli.command {
        return handle_init_command(force);
    }
    if let Commands::CheckWait { value } = &cli.command {
        return handle_check_wait(value);
    }

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::new_from_file(path)?,
        None => Settings::new()?,
    };
    warn_about_nodes(&settings);

    let driver: Arc<dyn VirtualizationDriver> = Arc::new(HttpDriver::new());

    match cli.command {
        Commands::Serve { port } => {
            let server_port = port.unwrap_or(settings.server.port);
            info!("Starting server on port {}", server_port);
            crate::api::run_server(&settings, server_port, driver).await?;
        }
        Commands::TestConnection { url, username, password } => {
            let driver = settings.bounded_driver(driver);
            let status = test_connection(driver, &url, &username, Secret::new(password)).await;
            match status {
                ConnectionStatus::Ok => println!("{} Connected to {}", "✓".green(), url),
                ConnectionStatus::Error(message) => {
                    println!("{} {}", "✗".red(), message);
                    return Err(anyhow!("connection test failed"));
                }
            }
        }
        command => {
            let registry = settings.build_registry(driver);
            handle_fleet_command(command, &registry, &settings).await?;
        }
    }

    Ok(())
}

async fn handle_fleet_command(command: Commands, registry: &HostRegistry, settings: &Settings) -> Result<()> {
    match command {
        Commands::Hosts => {
            println!("{}", "Virtualization Hosts:".bold());
            for host in registry.list_hosts() {
                println!("- {} ({} as {})", host.name(), host.connection().url, host.connection().username);
            }
        }
        Commands::Machines { host, cached } => {
            if registry.find_host(&host).is_none() {
                println!("{} Unknown host '{}'", "!".yellow(), host);
            }
            let machines = if cached {
                registry.cached_for_host(&host).await?
            } else {
                registry.list_for_host(&host).await?
            };
            println!("{}", format!("Virtual Machines on {}:", host).bold());
            for vm in machines.iter() {
                println!("- {}", vm.name());
            }
        }
        Commands::Snapshots { host, vm } => {
            println!("{}", format!("Snapshots of {} on {}:", vm, host).bold());
            for snapshot in registry.list_snapshots(&host, &vm).await? {
                println!("- {}", snapshot);
            }
        }
        Commands::FindNode { mac } => {
            let mac: MacAddress = mac.parse()?;
            let scan = registry.scan_nodes_by_mac(&settings.nodes, &mac).await;
            for failure in &scan.failures {
                println!("{} {}: {}", "!".yellow(), failure.node.name, failure.error);
            }
            match scan.matched {
                Some(node) => println!(
                    "{} {} ({} on {})",
                    "✓".green(),
                    node.name,
                    node.virtual_machine_name,
                    node.host_name
                ),
                None => return Err(anyhow!("no compute node has MAC address {}", mac)),
            }
        }
        Commands::Verify => {
            for node in &settings.nodes {
                let status = match registry.verify_binding(node).await {
                    Ok(IdentityCheck::Confirmed) => "confirmed".green(),
                    Ok(IdentityCheck::Mismatch { actual: Some(mac) }) => format!("mismatch (machine has {})", mac).red(),
                    Ok(IdentityCheck::Mismatch { actual: None }) => "mismatch (machine has no MAC)".red(),
                    Ok(IdentityCheck::Unresolved) => "machine not found".yellow(),
                    Ok(IdentityCheck::NotDeclared) => "no MAC declared".normal(),
                    Err(e) => {
                        error!(node = %node.name, error = %e, "Verification failed");
                        format!("error: {}", e).red()
                    }
                };
                println!("- {} ({})", node.name, status);
            }
        }
        Commands::Serve { .. }
        | Commands::TestConnection { .. }
        | Commands::CheckWait { .. }
        | Commands::Init { .. } => unreachable!("handled before the registry is built"),
    }

    Ok(())
}

fn handle_check_wait(value: &str) -> Result<()> {
    match validate_startup_wait(value) {
        Ok(StartupWaitCheck::Ok) => println!("{} {} seconds", "✓".green(), value),
        Ok(StartupWaitCheck::Warning(message)) => println!("{} {}", "!".yellow(), message),
        Err(e) => {
            println!("{} {}", "✗".red(), e);
            return Err(e.into());
        }
    }
    Ok(())
}

fn warn_about_nodes(settings: &Settings) {
    for node in &settings.nodes {
        if let Ok(StartupWaitCheck::Warning(message)) =
            validate_startup_wait(&node.startup_wait_seconds.to_string())
        {
            warn!(node = %node.name, "{}", message);
        }
    }
}

fn handle_init_command(force: bool) -> Result<()> {
    let config_dir = PathBuf::from("config");
    let target = config_dir.join("default.toml");
    if target.exists() && !force {
        error!("Configuration already exists. Use --force to overwrite.");
        return Ok(());
    }

    std::fs::create_dir_all(&config_dir)?;
    let default_config = crate::config::generate_default_config();
    let config_str = toml::to_string_pretty(&default_config)?;
    std::fs::write(&target, config_str)?;

    println!("{} Default configuration generated", "✓".green());
    Ok(())
}
