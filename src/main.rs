use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use vpnmux::manager::ActiveConnection;
use vpnmux::profile::LocationSummary;
use vpnmux::prompt::{AssumeYes, Confirm, TerminalConfirm};
use vpnmux::{Config, ManagerError, VpnManager};

#[derive(Parser)]
#[command(name = "vpnmux")]
#[command(about = "Named OpenVPN connections managed as screen/tmux sessions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Answer yes to every confirmation prompt
    #[arg(short = 'y', long, global = true)]
    yes: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Vpn(VpnCommands),
    /// Generate default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,

        /// Where to write the file
        #[arg(long, default_value = "vpnmux.toml")]
        path: PathBuf,
    },
}

/// Commands that need a loaded config
#[derive(Subcommand)]
enum VpnCommands {
    /// Connect to a VPN profile
    ///
    /// The profile is a network name, an alias, or "<location> <network>".
    Connect {
        #[arg(required = true, num_args = 1..)]
        profile: Vec<String>,
    },
    /// Disconnect from a VPN profile, or from every VPN connection
    Disconnect { profile: Vec<String> },
    /// Show status of VPN connections
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all available VPN profiles
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    let success = run(cli).await;
    std::process::exit(if success { 0 } else { 1 });
}

async fn run(cli: Cli) -> bool {
    let command = match cli.command {
        Commands::Init { force, path } => return init(&path, force),
        Commands::Vpn(command) => command,
    };

    let Some(manager) = open_manager(cli.config.as_deref(), cli.verbose, cli.yes) else {
        return false;
    };

    match command {
        VpnCommands::Connect { profile } => {
            let input = profile.join(" ");
            match manager.connect(&input).await {
                Ok(session) => {
                    info!("Connected {} in session {}", input, session);
                    true
                }
                Err(e) => report(e),
            }
        }
        VpnCommands::Disconnect { profile } => {
            let input = (!profile.is_empty()).then(|| profile.join(" "));
            match manager.disconnect(input.as_deref()).await {
                Ok(()) => true,
                Err(e) => report(e),
            }
        }
        VpnCommands::Status { json } => {
            let active = manager.status();
            if json {
                print_json(&active)
            } else {
                print_status(&active);
                true
            }
        }
        VpnCommands::List { json } => {
            let profiles = manager.list_profiles();
            if json {
                print_json(&profiles)
            } else {
                print_profiles(&profiles);
                true
            }
        }
    }
}

/// Load the config, start logging and build the manager
fn open_manager(config_path: Option<&Path>, verbose: bool, yes: bool) -> Option<VpnManager> {
    let config = match Config::locate(config_path).and_then(|path| Config::load(&path)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return None;
        }
    };

    if let Err(e) = vpnmux::logging::init(&config.logging, verbose) {
        eprintln!("{}", e);
    }

    let prompt: Box<dyn Confirm> = if yes {
        Box::new(AssumeYes)
    } else {
        Box::new(TerminalConfirm::new())
    };
    Some(VpnManager::from_config(config, prompt))
}

fn init(path: &Path, force: bool) -> bool {
    if path.exists() && !force {
        eprintln!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
        return false;
    }
    match Config::default().save(path) {
        Ok(()) => {
            println!("Created default config: {}", path.display());
            true
        }
        Err(e) => {
            eprintln!("{}", e);
            false
        }
    }
}

/// Print an operation failure; always reports failure
fn report(err: ManagerError) -> bool {
    error!("{}", err);
    match &err {
        ManagerError::ProfileNotFound { suggestions, .. } => {
            println!("{}", err);
            if !suggestions.is_empty() {
                println!("Did you mean:");
                for suggestion in suggestions {
                    println!("  {}", suggestion);
                }
            }
        }
        ManagerError::NotConnected(_) => println!("{}", err),
        _ => eprintln!("{}", err),
    }
    false
}

fn print_json<T: serde::Serialize>(value: &T) -> bool {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{}", text);
            true
        }
        Err(e) => {
            eprintln!("Failed to render JSON: {}", e);
            false
        }
    }
}

fn print_status(active: &[ActiveConnection]) {
    if active.is_empty() {
        println!("No active VPN connections");
        return;
    }
    println!("Active VPN connections:");
    for connection in active {
        println!(
            "  {} {} ({})",
            connection.location, connection.network, connection.session
        );
        for line in &connection.output {
            println!("    {}", line);
        }
    }
}

fn print_profiles(locations: &[LocationSummary]) {
    println!("Available VPN profiles:");
    for location in locations {
        println!("\n{} - {}", location.location, location.description);
        for network in &location.networks {
            let aliases = if network.aliases.is_empty() {
                String::new()
            } else {
                format!(" (aliases: {})", network.aliases.join(", "))
            };
            println!("  {} - {}{}", network.network, network.description, aliases);
        }
    }
}
