//! Buffer Monitoring Daemon Entry Point

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use sonic_bst::SimulatedAsic;
use sonic_bufmond::{BufmonConfig, BufmonDaemon};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// SONiC buffer occupancy monitoring daemon
#[derive(Parser, Debug)]
#[command(name = "bufmond")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short = 'c', long, default_value = sonic_bufmond::config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Override the number of hardware units
    #[arg(long)]
    hw_units: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .init();

    info!("Starting bufmond");

    let mut config = BufmonConfig::load_or_default(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(units) = args.hw_units {
        config.hw_units = units;
    }
    config.validate()?;

    info!(
        "Hardware units: {}, counters: {}",
        config.hw_units,
        config.counters.len()
    );

    let asic = Arc::new(SimulatedAsic::new(
        config.hw_units,
        config.simulation.ports_per_unit,
    ));
    let (daemon, rx) = BufmonDaemon::new(asic, &config);
    let worker = daemon.spawn_trigger_worker(rx);

    daemon
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    worker.abort();
    info!("bufmond stopped");
    Ok(())
}
