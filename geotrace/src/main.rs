//! geotrace - position telemetry agent
//!
//! The agent resolves its device identity once, subscribes to a location
//! provider, and streams each position sample to the configured collector.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Identity: $XDG_DATA_HOME/geotrace/identity.db (~/.local/share/geotrace/identity.db)
//! - Config: $XDG_CONFIG_HOME/geotrace/config.toml (~/.config/geotrace/config.toml)
//! - Logs: $XDG_STATE_HOME/geotrace/geotrace.log (~/.local/state/geotrace/geotrace.log)

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use geotrace_core::config::{ProviderConfig, ProviderKind};
use geotrace_core::sampler::providers::{GpsdProvider, ReplayProvider};
use geotrace_core::sampler::LocationProvider;
use geotrace_core::{Config, IdentityStore, PositionSampler, TelemetryReporter};

#[derive(Parser)]
#[command(name = "geotrace")]
#[command(about = "Stream position telemetry to a remote collector")]
#[command(version)]
struct Args {
    /// Config file path (default: XDG config location)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the telemetry agent
    Run {
        /// Replay fixes from a JSONL file instead of the configured provider
        #[arg(long)]
        replay: Option<PathBuf>,
    },

    /// Show resolved configuration and readiness
    Status,

    /// Print the device identifier, creating it on first use
    Identity,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Ensure XDG environment variables are set before using core library
    Config::ensure_xdg_env();

    let config = match &args.config {
        Some(path) => Config::load_from(path).context("failed to load configuration")?,
        None => Config::load().context("failed to load configuration")?,
    };

    match args.command {
        Command::Run { replay } => cmd_run(config, replay).await,
        Command::Status => cmd_status(&config),
        Command::Identity => cmd_identity(),
    }
}

async fn cmd_run(mut config: Config, replay: Option<PathBuf>) -> Result<()> {
    if let Some(path) = replay {
        config.provider.source = ProviderKind::Replay;
        config.provider.replay_path = Some(path);
    }
    config.validate().context("invalid configuration")?;

    let _log_guard = geotrace_core::logging::init(&config.logging)
        .context("failed to initialize logging")?;

    tracing::info!("geotrace starting");

    // Identity failure is fatal: the agent cannot self-identify
    let store = IdentityStore::open(&Config::identity_store_path())
        .context("failed to open identity store")?;
    let device_id = store
        .get_or_create_device_id()
        .context("failed to resolve device identity")?;
    tracing::info!(device_id = %device_id, "Device identity resolved");

    let provider = build_provider(&config.provider)?;
    let reporter = TelemetryReporter::new(&config.reporter, device_id)
        .context("failed to create telemetry reporter")?;
    let sampler = PositionSampler::new(config.sampler.clone(), provider);

    tokio::select! {
        result = sampler.run(|sample| reporter.report(&sample)) => {
            result.context("sampler stopped")?;
            tracing::info!("sampling finished");
        }
        _ = tokio::signal::ctrl_c() => {
            // In-flight dispatches are left to complete or fail silently
            tracing::info!("shutdown requested");
        }
    }

    Ok(())
}

fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn LocationProvider>> {
    match config.source {
        ProviderKind::Gpsd => Ok(Arc::new(GpsdProvider::new(config.gpsd_addr.clone()))),
        ProviderKind::Replay => {
            let path = config
                .replay_path
                .as_ref()
                .context("provider.replay_path is required for the replay provider")?;
            let provider =
                ReplayProvider::from_path(path, Duration::from_millis(config.replay_tick_ms))
                    .context("failed to load replay file")?;
            Ok(Arc::new(provider))
        }
    }
}

fn cmd_status(config: &Config) -> Result<()> {
    println!("geotrace configuration");
    println!("======================");
    println!();

    let sampler = &config.sampler;
    println!("Accuracy:         {:?}", sampler.desired_accuracy);
    println!("Interval:         {}ms", sampler.sampling_interval_ms);
    println!("Min interval:     {}ms", sampler.min_interval_ms);
    println!("Min distance:     {}m", sampler.min_distance_meters);
    println!("Wait for fix:     {}", sampler.wait_for_high_accuracy);
    match sampler.max_samples {
        Some(max) => println!("Max samples:      {}", max),
        None => println!("Max samples:      unbounded"),
    }
    println!();

    println!(
        "Provider:         {:?}",
        config.provider.source
    );
    match config.provider.source {
        ProviderKind::Gpsd => println!("gpsd address:     {}", config.provider.gpsd_addr),
        ProviderKind::Replay => println!(
            "Replay file:      {}",
            config
                .provider
                .replay_path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<not set>".to_string())
        ),
    }
    println!();

    println!(
        "Collector URL:    {}",
        config.reporter.collector_url.as_deref().unwrap_or("<not set>")
    );
    println!("Timeout:          {}s", config.reporter.timeout_secs);
    println!("Max in-flight:    {}", config.reporter.max_in_flight);
    println!();

    if config.reporter.is_ready() {
        println!("Status: ready to report");
    } else {
        println!("Status: not ready (set reporter.collector_url in config.toml):");
        println!();
        println!("  [reporter]");
        println!("  collector_url = \"https://collector.example.com/locations\"");
    }

    Ok(())
}

fn cmd_identity() -> Result<()> {
    let store = IdentityStore::open(&Config::identity_store_path())
        .context("failed to open identity store")?;
    let device_id = store
        .get_or_create_device_id()
        .context("failed to resolve device identity")?;

    println!("{}", device_id);
    Ok(())
}
