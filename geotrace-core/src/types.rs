//! Domain types for position sampling

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Qualitative accuracy tier requested from the location provider
///
/// Maps onto the provider's best-effort accuracy class. Each tier carries
/// an error-radius bound used when `wait_for_high_accuracy` delays the
/// first delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccuracyTier {
    /// Best available fix quality (error radius within 50 m)
    #[default]
    High,
    /// Coarse positioning (error radius within 500 m)
    Balanced,
    /// Cell-level positioning (error radius within 5 km)
    Low,
}

impl AccuracyTier {
    /// Maximum acceptable error radius for this tier, in meters
    pub fn max_radius_m(&self) -> f64 {
        match self {
            AccuracyTier::High => 50.0,
            AccuracyTier::Balanced => 500.0,
            AccuracyTier::Low => 5000.0,
        }
    }
}

/// A resolved geographic position from the location subsystem
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Estimated error radius in meters, when the provider reports one
    #[serde(default)]
    pub accuracy_m: Option<f64>,
}

impl Fix {
    /// Whether this fix satisfies the tier's error bound
    ///
    /// A fix without an accuracy estimate cannot be evaluated and is
    /// accepted; only a fix that reports a radius above the bound is
    /// rejected.
    pub fn meets(&self, tier: AccuracyTier) -> bool {
        self.accuracy_m.map_or(true, |a| a <= tier.max_radius_m())
    }
}

/// A position sample delivered by the sampler
///
/// Ephemeral: produced per sampling cycle, handed to the reporter, never
/// retained. `captured_at` is the delivery time, not part of the wire
/// envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSample {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// When the sampler delivered this sample
    pub captured_at: DateTime<Utc>,
}

impl PositionSample {
    /// Create a sample from a fix, stamped with the current time
    pub fn from_fix(fix: &Fix) -> Self {
        Self {
            latitude: fix.latitude,
            longitude: fix.longitude,
            captured_at: Utc::now(),
        }
    }
}

/// Great-circle distance between two points in meters (haversine)
pub(crate) fn distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const EARTH_RADIUS_M: f64 = 6_371_000.0;

    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * a.sqrt().asin()
}
