//! Command-line entry point and the scheduling loop.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::MonitorConfig;
use crate::monitor::Monitor;
use vigil_probe::FileStore;

/// DNS/TLS posture monitor: alerts when domains deviate from their recorded
/// baseline
#[derive(Debug, Parser)]
#[command(name = "vigil", version, about)]
pub struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "vigil.toml")]
    pub config: PathBuf,

    /// Run a single check cycle and exit
    #[arg(long)]
    pub once: bool,

    /// Override the configured check interval in seconds
    #[arg(long)]
    pub interval: Option<u64>,

    /// Override the configured state directory
    #[arg(long)]
    pub state_dir: Option<PathBuf>,
}

/// Parse arguments, load configuration and run the monitor
pub async fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    // rustls 0.23 needs a process-level crypto provider before any TLS use;
    // a second install attempt (e.g. from tests) is harmless
    let _ = rustls::crypto::ring::default_provider().install_default();

    let mut config = MonitorConfig::load(&args.config)?;
    if let Some(interval) = args.interval {
        config.interval_secs = interval;
    }
    if let Some(state_dir) = args.state_dir {
        config.state_dir = state_dir;
    }
    config.validate()?;

    let store = Arc::new(FileStore::new(&config.state_dir));
    let monitor = Monitor::new(&config, store)?;

    if args.once {
        monitor.tick().await;
        return Ok(());
    }

    info!(
        interval_secs = config.interval_secs,
        domains = config.domains.len(),
        "vigil started"
    );
    let mut interval = tokio::time::interval(Duration::from_secs(config.interval_secs));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        monitor.tick().await;
    }
}

/// Console logging, honoring `RUST_LOG` and defaulting to info
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
