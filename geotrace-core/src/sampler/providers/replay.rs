//! Replay location provider
//!
//! Feeds fixes from a JSONL file on a fixed tick, one record per line:
//!
//! ```text
//! {"lat": 40.7128, "lon": -74.0060, "accuracy_m": 10.0}
//! {"lat": 40.7130, "lon": -74.0058}
//! ```
//!
//! Useful for demos and end-to-end tests where no GPS hardware exists.
//! After the last record the final fix persists as the most recent known
//! position, like a receiver that stopped moving.

use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::sampler::provider::{FixCell, LocationProvider, UpdateRequest};
use crate::types::Fix;

/// One line of a replay file
#[derive(Debug, Deserialize)]
struct ReplayRecord {
    lat: f64,
    lon: f64,
    #[serde(default)]
    accuracy_m: Option<f64>,
}

/// Location provider that replays recorded fixes
pub struct ReplayProvider {
    fixes: Vec<Fix>,
    tick: Duration,
    cell: FixCell,
}

impl ReplayProvider {
    /// Load a replay file
    ///
    /// Malformed lines are logged and skipped; an empty or fully
    /// malformed file is a bootstrap error.
    pub fn from_path(path: &Path, tick: Duration) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| Error::Provider(format!("cannot open replay file {:?}: {}", path, e)))?;

        let mut fixes = Vec::new();
        for (lineno, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ReplayRecord>(&line) {
                Ok(record) => fixes.push(Fix {
                    latitude: record.lat,
                    longitude: record.lon,
                    accuracy_m: record.accuracy_m,
                }),
                Err(e) => {
                    tracing::warn!(line = lineno + 1, error = %e, "skipping malformed replay line");
                }
            }
        }

        if fixes.is_empty() {
            return Err(Error::Provider(format!(
                "replay file {:?} contains no fixes",
                path
            )));
        }

        Ok(Self {
            fixes,
            tick,
            cell: FixCell::new(),
        })
    }

    /// Number of fixes loaded from the file
    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    /// Whether any fixes were loaded (always false after `from_path`)
    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }
}

impl LocationProvider for ReplayProvider {
    fn start_updates(&self, _request: UpdateRequest) -> Result<()> {
        let fixes = self.fixes.clone();
        let tick = self.tick;
        let cell = self.cell.clone();

        tokio::spawn(async move {
            tracing::info!(fixes = fixes.len(), "Replay started");
            for fix in fixes {
                cell.set(fix);
                tokio::time::sleep(tick).await;
            }
            tracing::debug!("replay exhausted, holding last fix");
        });

        Ok(())
    }

    fn last_fix(&self) -> Option<Fix> {
        self.cell.get()
    }
}
