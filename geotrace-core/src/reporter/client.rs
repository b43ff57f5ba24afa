//! HTTP dispatch to the telemetry collector

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use tokio::sync::Semaphore;

use crate::config::ReporterConfig;
use crate::error::{Error, Result};
use crate::types::PositionSample;

use super::envelope::TelemetryEnvelope;

/// Fire-and-forget HTTP reporter for position samples
///
/// Owns the single shared `reqwest::Client` reused across all dispatches;
/// the client is concurrency-safe by construction (stateless request
/// builder over a connection pool), so no locking is needed. The device
/// identity is read-only after construction.
pub struct TelemetryReporter {
    http_client: reqwest::Client,
    collector_url: String,
    device_id: String,
    in_flight: Arc<Semaphore>,
}

impl TelemetryReporter {
    /// Create a reporter from configuration
    ///
    /// Returns an error if the configuration is invalid or the HTTP
    /// client cannot be constructed.
    pub fn new(config: &ReporterConfig, device_id: String) -> Result<Self> {
        config.validate()?;

        let collector_url = config
            .collector_url
            .clone()
            .ok_or_else(|| Error::Config("reporter.collector_url is required".to_string()))?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Reporter(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            collector_url,
            device_id,
            in_flight: Arc::new(Semaphore::new(config.max_in_flight)),
        })
    }

    /// The device identifier stamped onto every envelope
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Dispatch one sample to the collector
    ///
    /// Returns immediately: the POST runs on its own Tokio task,
    /// overlapping freely with later samples and completing in any order.
    /// Every failure (connection refused, timeout, DNS, non-2xx) is
    /// absorbed inside the task; nothing propagates to the caller. When
    /// `max_in_flight` dispatches are already pending, the sample is
    /// dropped instead of queued.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn report(&self, sample: &PositionSample) {
        let envelope = TelemetryEnvelope::new(&self.device_id, sample);
        let body = match serde_json::to_vec(&envelope) {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(error = %e, "failed to serialize envelope");
                return;
            }
        };

        let permit = match self.in_flight.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                tracing::debug!("in-flight limit reached, dropping sample");
                return;
            }
        };

        let client = self.http_client.clone();
        let url = self.collector_url.clone();

        tokio::spawn(async move {
            let _permit = permit;
            match client
                .post(&url)
                .header(CONTENT_TYPE, "application/json; charset=utf-8")
                .body(body)
                .send()
                .await
            {
                Ok(response) => {
                    if !response.status().is_success() {
                        tracing::debug!(status = %response.status(), "collector rejected sample");
                    }
                    // Dropping the response releases the connection back
                    // to the pool
                }
                Err(e) => {
                    tracing::debug!(error = %e, "telemetry dispatch failed");
                }
            }
        });
    }
}
