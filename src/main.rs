//! Vitals - local device health in your terminal
//!
//! Samples CPU, memory, disk and network interfaces, classifies them against
//! configurable thresholds, and can ask a managed switch over SNMP which port
//! each of this machine's interfaces is plugged into.

mod commands;
mod config;
mod core;
mod health;
mod integrations;
mod snapshot;
mod snmp;
mod ui;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;
use crate::core::app::App;

#[derive(Parser)]
#[command(name = "vitals")]
#[command(author = "Vitals Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Local device health dashboard with SNMP switch-port lookup", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Switch to query for port lookups (enables SNMP)
    #[arg(long, value_name = "ADDR", env = "VITALS_SNMP_SWITCH", global = true)]
    switch: Option<String>,

    /// SNMP read community
    #[arg(
        long,
        value_name = "STR",
        env = "VITALS_SNMP_COMMUNITY",
        hide_env_values = true,
        global = true
    )]
    community: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print one CPU, memory and disk reading
    Check {
        /// Print the snapshot JSON instead
        #[arg(long)]
        json: bool,
    },

    /// List active network interfaces and their switch ports
    Interfaces,

    /// Find the switch port a MAC address is connected to
    Lookup {
        /// Client MAC, e.g. aa:bb:cc:dd:ee:ff or AA-BB-CC-DD-EE-FF
        #[arg(short, long)]
        mac: String,

        /// Say why a lookup found nothing
        #[arg(short, long)]
        detailed: bool,
    },

    /// Write a JSON health snapshot
    Snapshot {
        /// Output file (defaults to health_snapshot_<timestamp>.json)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Write the default configuration file
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

fn setup_logging(verbosity: u8) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // The terminal belongs to the dashboard, so logs go to a file
    let log_dir = dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vitals")
        .join("logs");

    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "vitals.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive for the duration of the program
    let _logging_guard = setup_logging(cli.verbose)?;

    if let Some(Commands::Init { force }) = &cli.command {
        let path = match &cli.config {
            Some(path) => path.clone(),
            None => Config::default_path()
                .ok_or_else(|| anyhow::anyhow!("no config directory on this platform"))?,
        };
        // before loading, so a broken file can be replaced
        return config::init_config(&path, *force);
    }

    let mut config = Config::resolve(cli.config.as_deref())?;
    config.apply_overrides(cli.switch, cli.community);
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Some(Commands::Check { json }) => commands::print_check(&config, json).await?,
        Some(Commands::Interfaces) => commands::print_interfaces(&config).await?,
        Some(Commands::Lookup { mac, detailed }) => {
            commands::print_lookup(&config, &mac, detailed).await?
        }
        Some(Commands::Snapshot { output }) => {
            commands::write_snapshot(&config, output.as_deref()).await?
        }
        Some(Commands::Init { .. }) => {} // handled above
        None => {
            let mut app = App::new(config)?;
            app.run().await?;
        }
    }

    Ok(())
}
