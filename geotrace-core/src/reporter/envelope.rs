//! Wire envelope for telemetry dispatch

use serde::{Deserialize, Serialize};

use crate::types::PositionSample;

/// The payload sent per reported sample
///
/// A flat JSON object with exactly these three keys; the capture
/// timestamp is deliberately not on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEnvelope {
    /// Stable per-device identifier
    pub device_id: String,
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lon: f64,
}

impl TelemetryEnvelope {
    /// Build an envelope from a sample and the device identity
    pub fn new(device_id: &str, sample: &PositionSample) -> Self {
        Self {
            device_id: device_id.to_string(),
            lat: sample.latitude,
            lon: sample.longitude,
        }
    }
}
