//! Location provider seam
//!
//! A provider owns the actual position source (a gpsd socket, a replay
//! file, a test script) and exposes two things: a way to begin continuous
//! updates, and the most recent known fix. The sampler owns the cadence
//! and polls `last_fix` on its own timer.

use std::sync::{Arc, RwLock};

use crate::error::Result;
use crate::types::{AccuracyTier, Fix};

/// Parameters passed to the provider when updates begin
#[derive(Debug, Clone, Copy)]
pub struct UpdateRequest {
    /// Requested accuracy tier (best-effort hint)
    pub accuracy: AccuracyTier,
}

/// A source of position fixes
///
/// Implementations keep their own most-recent-fix state current in the
/// background; `last_fix` must be cheap and never block.
pub trait LocationProvider: Send + Sync {
    /// Begin continuous position updates
    ///
    /// Called once by the sampler before its first cycle. Returns an
    /// error only for bootstrap failures; a source that degrades later
    /// should keep `last_fix` at its previous value or `None`.
    fn start_updates(&self, request: UpdateRequest) -> Result<()>;

    /// Most recent known fix, or `None` before the first fix resolves
    fn last_fix(&self) -> Option<Fix>;
}

/// Shared slot holding a provider's most recent fix
///
/// Cloned between the provider handle and its background update task.
#[derive(Clone, Default)]
pub struct FixCell {
    inner: Arc<RwLock<Option<Fix>>>,
}

impl FixCell {
    /// Create an empty cell
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the most recent fix
    pub fn set(&self, fix: Fix) {
        *self.inner.write().expect("fix cell lock poisoned") = Some(fix);
    }

    /// Read the most recent fix
    pub fn get(&self) -> Option<Fix> {
        *self.inner.read().expect("fix cell lock poisoned")
    }
}
