use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use log::{info, warn};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use wan_failover::{JsonStore, LogNotifier, RouteService, SystemCommandExecutor};

/// WAN Failover - Priority-based default gateway manager
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about)]
struct Args {
    /// Path to configuration file
    #[clap(long)]
    config: Option<PathBuf>,

    /// Directory holding priority.json and mapping.json
    #[clap(short = 'd', long)]
    data_dir: Option<PathBuf>,

    /// Reconciliation interval in seconds
    #[clap(short = 't', long)]
    interval: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
struct Config {
    storage: Option<StorageConfig>,
    monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Deserialize, Clone)]
struct StorageConfig {
    data_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
struct MonitoringConfig {
    interval: Option<u64>,
}

fn log_with_timestamp(msg: &str) {
    info!("[{}] {}", Local::now().format("%Y-%m-%d %H:%M:%S"), msg);
}

fn main() -> Result<()> {
    env_logger::init();
    // Note: For detailed debug logging, set environment variable RUST_LOG=debug
    log_with_timestamp("Starting WAN Failover");

    let args = Args::parse();

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("/etc/wan-failover/config.toml"));

    let config_file: Option<Config> = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)
            .context(format!("Failed to read config file {:?}", config_path))?;
        Some(toml::from_str(&content).context("Failed to parse TOML")?)
    } else {
        log_with_timestamp("Configuration file does not exist, using command line arguments only");
        None
    };

    // Config values with precedence: Args -> Config File -> Defaults
    let data_dir = args
        .data_dir
        .clone()
        .or_else(|| {
            config_file
                .as_ref()
                .and_then(|c| c.storage.as_ref())
                .and_then(|s| s.data_dir.clone())
        })
        .unwrap_or_else(|| PathBuf::from("/var/lib/wan-failover"));

    let interval_secs = args
        .interval
        .or_else(|| {
            config_file
                .as_ref()
                .and_then(|c| c.monitoring.as_ref())
                .and_then(|m| m.interval)
        })
        .unwrap_or(60);

    info!("Data directory: {:?}", data_dir);
    info!("Reconciliation interval: {}s", interval_secs);

    // route mutation needs CAP_NET_ADMIN
    if unsafe { libc::geteuid() } != 0 {
        warn!("Not running as root; route changes will likely fail");
    }

    let service = Arc::new(
        RouteService::new(
            Box::new(SystemCommandExecutor::new()),
            Box::new(JsonStore::new(&data_dir)),
            Box::new(LogNotifier),
            Duration::from_secs(interval_secs),
        )
        .context("Failed to initialize route service")?,
    );

    // startup apply is best effort, the periodic loop retries
    if let Err(e) = service.try_update_default() {
        warn!("Initial route update failed: {}", e);
    }

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || {
            stop.store(true, Ordering::SeqCst);
        })
        .context("Failed to install signal handler")?;
    }

    log_with_timestamp("Initialization complete, entering reconciliation loop");
    let worker = {
        let service = service.clone();
        let stop = stop.clone();
        thread::spawn(move || service.run(&stop))
    };

    worker
        .join()
        .map_err(|_| anyhow::anyhow!("Reconciliation thread panicked"))?;
    log_with_timestamp("Shut down cleanly");
    Ok(())
}
