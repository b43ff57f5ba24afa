//! gpsd location provider
//!
//! Subscribes to a local gpsd daemon (default `127.0.0.1:2947`) in JSON
//! watch mode and keeps the most recent TPV report available as a fix.
//!
//! gpsd streams newline-delimited JSON reports. Only `TPV` reports with a
//! 2D-or-better mode carry a usable position; everything else (`SKY`,
//! `VERSION`, `DEVICES`, ...) is ignored. A malformed line is logged and
//! skipped, never fatal. A lost connection is retried on a fixed pause,
//! with the previous fix remaining the most recent known position.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::error::Result;
use crate::sampler::provider::{FixCell, LocationProvider, UpdateRequest};
use crate::types::Fix;

/// Command enabling gpsd's JSON report stream
const WATCH_COMMAND: &[u8] = b"?WATCH={\"enable\":true,\"json\":true}\n";

/// Pause before reconnecting after a lost or refused connection
const RECONNECT_PAUSE: Duration = Duration::from_secs(5);

/// Location provider backed by a gpsd daemon
pub struct GpsdProvider {
    addr: String,
    cell: FixCell,
}

impl GpsdProvider {
    /// Create a provider for the given gpsd address (host:port)
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            cell: FixCell::new(),
        }
    }
}

impl LocationProvider for GpsdProvider {
    fn start_updates(&self, request: UpdateRequest) -> Result<()> {
        // gpsd has no accuracy knob; the tier is consumed by the sampler's
        // first-fix wait
        tracing::debug!(addr = %self.addr, accuracy = ?request.accuracy, "starting gpsd watch");

        let addr = self.addr.clone();
        let cell = self.cell.clone();
        tokio::spawn(watch_loop(addr, cell));
        Ok(())
    }

    fn last_fix(&self) -> Option<Fix> {
        self.cell.get()
    }
}

/// Connect-and-watch loop; reconnects forever
async fn watch_loop(addr: String, cell: FixCell) {
    loop {
        match TcpStream::connect(&addr).await {
            Ok(stream) => {
                tracing::info!(addr = %addr, "Connected to gpsd");
                if let Err(e) = watch_stream(stream, &cell).await {
                    tracing::warn!(addr = %addr, error = %e, "gpsd connection lost");
                }
            }
            Err(e) => {
                tracing::warn!(addr = %addr, error = %e, "cannot reach gpsd");
            }
        }
        tokio::time::sleep(RECONNECT_PAUSE).await;
    }
}

/// Read reports from one gpsd connection until it closes or errors
async fn watch_stream(stream: TcpStream, cell: &FixCell) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    writer.write_all(WATCH_COMMAND).await?;

    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        if line.is_empty() {
            continue;
        }

        let report: serde_json::Value = match serde_json::from_str(&line) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed gpsd report");
                continue;
            }
        };

        if report.get("class").and_then(|c| c.as_str()) == Some("TPV") {
            if let Some(fix) = tpv_to_fix(&report) {
                tracing::trace!(lat = fix.latitude, lon = fix.longitude, "gpsd fix");
                cell.set(fix);
            }
        }
    }

    Ok(())
}

/// Extract a fix from a TPV report, if it carries a usable position
fn tpv_to_fix(report: &serde_json::Value) -> Option<Fix> {
    // mode: 0/1 = no fix, 2 = 2D, 3 = 3D
    if report.get("mode").and_then(|m| m.as_i64()).unwrap_or(0) < 2 {
        return None;
    }

    let latitude = report.get("lat")?.as_f64()?;
    let longitude = report.get("lon")?.as_f64()?;

    // eph is the 2D position error estimate; older daemons only report
    // the per-axis epx/epy
    let accuracy_m = report
        .get("eph")
        .and_then(|v| v.as_f64())
        .or_else(|| {
            let epx = report.get("epx")?.as_f64()?;
            let epy = report.get("epy")?.as_f64()?;
            Some(epx.max(epy))
        });

    Some(Fix {
        latitude,
        longitude,
        accuracy_m,
    })
}
