//! Error types for geotrace-core

use thiserror::Error;

/// Main error type for the geotrace-core library
///
/// Only startup-time failures live here. Per-sample conditions are not
/// errors: a missing fix skips the sampling cycle, and a failed delivery
/// is absorbed inside the reporter per the fire-and-forget contract.
#[derive(Error, Debug)]
pub enum Error {
    /// Identity store error (fatal: the agent cannot self-identify)
    #[error("identity store error: {0}")]
    Identity(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Location provider bootstrap error
    #[error("provider error: {0}")]
    Provider(String),

    /// Reporter construction error
    #[error("reporter error: {0}")]
    Reporter(String),
}

/// Result type alias for geotrace-core
pub type Result<T> = std::result::Result<T, Error>;
