//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/geotrace/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/geotrace/` (~/.config/geotrace/)
//! - Data: `$XDG_DATA_HOME/geotrace/` (~/.local/share/geotrace/)
//! - State/Logs: `$XDG_STATE_HOME/geotrace/` (~/.local/state/geotrace/)

use crate::error::{Error, Result};
use crate::types::AccuracyTier;
use serde::Deserialize;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Position sampler configuration
    #[serde(default)]
    pub sampler: SamplerConfig,

    /// Telemetry reporter configuration
    #[serde(default)]
    pub reporter: ReporterConfig,

    /// Location provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Position sampler configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SamplerConfig {
    /// Accuracy tier requested from the location provider
    #[serde(default)]
    pub desired_accuracy: AccuracyTier,

    /// Target interval between samples in milliseconds
    #[serde(default = "default_sampling_interval_ms")]
    pub sampling_interval_ms: u64,

    /// Hard floor between two deliveries in milliseconds
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    /// Minimum displacement to deliver a sample; 0 reports even when stationary
    #[serde(default)]
    pub min_distance_meters: f64,

    /// Delay the first delivery until a fix within the tier's error bound
    #[serde(default = "default_wait_for_high_accuracy")]
    pub wait_for_high_accuracy: bool,

    /// Stop after this many samples; unbounded when absent
    #[serde(default)]
    pub max_samples: Option<u64>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            desired_accuracy: AccuracyTier::default(),
            sampling_interval_ms: default_sampling_interval_ms(),
            min_interval_ms: default_min_interval_ms(),
            min_distance_meters: 0.0,
            wait_for_high_accuracy: default_wait_for_high_accuracy(),
            max_samples: None,
        }
    }
}

fn default_sampling_interval_ms() -> u64 {
    3000
}

fn default_min_interval_ms() -> u64 {
    500
}

fn default_wait_for_high_accuracy() -> bool {
    true
}

impl SamplerConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.sampling_interval_ms == 0 {
            return Err(Error::Config(
                "sampler.sampling_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.min_distance_meters < 0.0 {
            return Err(Error::Config(
                "sampler.min_distance_meters must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Telemetry reporter configuration
///
/// The collector URL is read once at startup and is fixed for the life of
/// the process.
#[derive(Debug, Deserialize, Clone)]
pub struct ReporterConfig {
    /// Collector endpoint URL (e.g., `https://collector.example.com/locations`)
    pub collector_url: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_reporter_timeout")]
    pub timeout_secs: u64,

    /// Upper bound on concurrent in-flight dispatches
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            collector_url: None,
            timeout_secs: default_reporter_timeout(),
            max_in_flight: default_max_in_flight(),
        }
    }
}

fn default_reporter_timeout() -> u64 {
    10
}

fn default_max_in_flight() -> usize {
    32
}

impl ReporterConfig {
    /// Check if the reporter is properly configured
    pub fn is_ready(&self) -> bool {
        self.collector_url.is_some()
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.collector_url.is_none() {
            return Err(Error::Config(
                "reporter.collector_url is required".to_string(),
            ));
        }
        if self.max_in_flight == 0 {
            return Err(Error::Config(
                "reporter.max_in_flight must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Location provider selection
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Subscribe to a local gpsd daemon
    #[default]
    Gpsd,
    /// Replay fixes from a JSONL file
    Replay,
}

/// Location provider configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Which provider backs the sampler
    #[serde(default)]
    pub source: ProviderKind,

    /// gpsd address (host:port)
    #[serde(default = "default_gpsd_addr")]
    pub gpsd_addr: String,

    /// Fix file for the replay provider
    pub replay_path: Option<PathBuf>,

    /// Interval between replayed fixes in milliseconds
    #[serde(default = "default_replay_tick_ms")]
    pub replay_tick_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            source: ProviderKind::default(),
            gpsd_addr: default_gpsd_addr(),
            replay_path: None,
            replay_tick_ms: default_replay_tick_ms(),
        }
    }
}

fn default_gpsd_addr() -> String {
    "127.0.0.1:2947".to_string()
}

fn default_replay_tick_ms() -> u64 {
    1000
}

impl ProviderConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.source == ProviderKind::Replay && self.replay_path.is_none() {
            return Err(Error::Config(
                "provider.replay_path is required when provider.source is \"replay\"".to_string(),
            ));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Validate the whole configuration for running the agent
    pub fn validate(&self) -> Result<()> {
        self.sampler.validate()?;
        self.reporter.validate()?;
        self.provider.validate()?;
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/geotrace/config.toml` (~/.config/geotrace/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("geotrace").join("config.toml")
    }

    /// Returns the data directory path (for the identity store)
    ///
    /// `$XDG_DATA_HOME/geotrace/` (~/.local/share/geotrace/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("geotrace")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/geotrace/` (~/.local/state/geotrace/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("geotrace")
    }

    /// Returns the identity store path
    ///
    /// `$XDG_DATA_HOME/geotrace/identity.db` (~/.local/share/geotrace/identity.db)
    pub fn identity_store_path() -> PathBuf {
        Self::data_dir().join("identity.db")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/geotrace/geotrace.log` (~/.local/state/geotrace/geotrace.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("geotrace.log")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for the CLI binary that wants explicit, stable path
    /// behavior before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}
