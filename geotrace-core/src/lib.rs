//! # geotrace-core
//!
//! Core library for geotrace - a lightweight position telemetry agent.
//!
//! This library provides:
//! - A durable, per-installation device identity
//! - A cadence-driven position sampler over pluggable location providers
//! - A fire-and-forget HTTP reporter toward a remote collector
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! One logical stream of samples fans out into concurrent dispatches:
//!
//! ```text
//! LocationProvider → PositionSampler → TelemetryReporter → collector
//!      (fixes)        (one cadence)     (task per sample)
//! ```
//!
//! The identity store resolves the device identifier exactly once; the
//! reporter stamps it onto every envelope. Delivery is best-effort: a
//! failed dispatch never slows or stops the sampling cadence.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use geotrace_core::{Config, IdentityStore, PositionSampler, TelemetryReporter};
//! use geotrace_core::sampler::providers::GpsdProvider;
//!
//! # async fn run() -> geotrace_core::Result<()> {
//! let config = Config::load()?;
//!
//! let store = IdentityStore::open(&Config::identity_store_path())?;
//! let device_id = store.get_or_create_device_id()?;
//!
//! let provider = Arc::new(GpsdProvider::new(config.provider.gpsd_addr.clone()));
//! let reporter = TelemetryReporter::new(&config.reporter, device_id)?;
//!
//! PositionSampler::new(config.sampler.clone(), provider)
//!     .run(|sample| reporter.report(&sample))
//!     .await
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use identity::IdentityStore;
pub use reporter::{TelemetryEnvelope, TelemetryReporter};
pub use sampler::{LocationProvider, PositionSampler};
pub use types::*;

// Public modules
pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod reporter;
pub mod sampler;
pub mod types;
