//! Integration tests for the geotrace sampling-and-reporting loop
//!
//! These tests drive the full identity → sampler → reporter pipeline
//! against a stub collector on a local TCP socket, verifying the wire
//! envelopes the collector actually receives.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use geotrace_core::config::{ReporterConfig, SamplerConfig};
use geotrace_core::sampler::providers::ReplayProvider;
use geotrace_core::sampler::{LocationProvider, UpdateRequest};
use geotrace_core::{
    AccuracyTier, Config, Fix, IdentityStore, PositionSampler, TelemetryEnvelope, TelemetryReporter,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Stub collector: accepts POSTs, records request bodies, answers 200
/// (or the given status)
struct StubCollector {
    url: String,
    bodies: Arc<Mutex<Vec<String>>>,
    requests: Arc<AtomicUsize>,
}

impl StubCollector {
    async fn start(status_line: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let bodies: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let requests = Arc::new(AtomicUsize::new(0));

        let server_bodies = bodies.clone();
        let server_requests = requests.clone();
        tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    return;
                };
                let bodies = server_bodies.clone();
                let requests = server_requests.clone();
                tokio::spawn(async move {
                    if let Some(body) = read_request(socket, status_line).await {
                        bodies.lock().unwrap().push(body);
                    }
                    requests.fetch_add(1, Ordering::SeqCst);
                });
            }
        });

        Self {
            url: format!("http://{}/ingest", addr),
            bodies,
            requests,
        }
    }

    fn bodies(&self) -> Vec<String> {
        self.bodies.lock().unwrap().clone()
    }

    async fn wait_for_requests(&self, count: usize) {
        for _ in 0..100 {
            if self.requests.load(Ordering::SeqCst) >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "expected {} requests, saw {}",
            count,
            self.requests.load(Ordering::SeqCst)
        );
    }
}

/// Read one HTTP request, reply with the given status line, return the body
async fn read_request(mut socket: tokio::net::TcpStream, status_line: &str) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find_crlf_crlf(&buf) {
            break pos;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length: usize = headers
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") {
                value.trim().parse().ok()
            } else {
                None
            }
        })
        .unwrap_or(0);

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    let response = format!("{}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n", status_line);
    socket.write_all(response.as_bytes()).await.ok()?;

    String::from_utf8(body).ok()
}

fn find_crlf_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn reporter_config(url: &str) -> ReporterConfig {
    ReporterConfig {
        collector_url: Some(url.to_string()),
        timeout_secs: 2,
        ..Default::default()
    }
}

fn fast_sampler(max_samples: u64) -> SamplerConfig {
    SamplerConfig {
        desired_accuracy: AccuracyTier::High,
        sampling_interval_ms: 5,
        min_interval_ms: 0,
        min_distance_meters: 0.0,
        wait_for_high_accuracy: false,
        max_samples: Some(max_samples),
    }
}

/// Provider with one fixed position
struct StaticProvider(Fix);

impl LocationProvider for StaticProvider {
    fn start_updates(&self, _request: UpdateRequest) -> geotrace_core::Result<()> {
        Ok(())
    }

    fn last_fix(&self) -> Option<Fix> {
        Some(self.0)
    }
}

// ============================================
// End-to-end loop
// ============================================

#[tokio::test]
async fn test_samples_reach_the_collector_with_device_identity() {
    let collector = StubCollector::start("HTTP/1.1 200 OK").await;

    let store = IdentityStore::open_in_memory().unwrap();
    let device_id = store.get_or_create_device_id().unwrap();

    let provider = Arc::new(StaticProvider(Fix {
        latitude: 40.7128,
        longitude: -74.0060,
        accuracy_m: Some(8.0),
    }));
    let reporter = TelemetryReporter::new(&reporter_config(&collector.url), device_id.clone()).unwrap();

    PositionSampler::new(fast_sampler(3), provider)
        .run(|sample| reporter.report(&sample))
        .await
        .unwrap();

    collector.wait_for_requests(3).await;

    let bodies = collector.bodies();
    assert_eq!(bodies.len(), 3);
    for body in &bodies {
        let envelope: TelemetryEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.device_id, device_id);
        assert_eq!(envelope.lat, 40.7128);
        assert_eq!(envelope.lon, -74.0060);
    }
}

#[tokio::test]
async fn test_failing_collector_never_stalls_the_sampler() {
    let collector = StubCollector::start("HTTP/1.1 500 Internal Server Error").await;

    let provider = Arc::new(StaticProvider(Fix {
        latitude: 1.0,
        longitude: 2.0,
        accuracy_m: None,
    }));
    let reporter =
        TelemetryReporter::new(&reporter_config(&collector.url), "dev-a".to_string()).unwrap();

    let started = std::time::Instant::now();
    let mut delivered = 0u64;
    PositionSampler::new(fast_sampler(5), provider)
        .run(|sample| {
            delivered += 1;
            reporter.report(&sample);
        })
        .await
        .unwrap();

    // All five cycles ran at cadence despite every dispatch failing
    assert_eq!(delivered, 5);
    assert!(started.elapsed() < Duration::from_secs(1));

    collector.wait_for_requests(5).await;
}

#[tokio::test]
async fn test_replayed_route_is_streamed_end_to_end() {
    use std::io::Write;

    let collector = StubCollector::start("HTTP/1.1 200 OK").await;

    let mut route = tempfile::NamedTempFile::new().unwrap();
    writeln!(route, "{}", r#"{"lat": 48.8566, "lon": 2.3522, "accuracy_m": 5.0}"#).unwrap();
    writeln!(route, "{}", r#"{"lat": 48.8570, "lon": 2.3530, "accuracy_m": 5.0}"#).unwrap();

    let provider =
        Arc::new(ReplayProvider::from_path(route.path(), Duration::from_millis(10)).unwrap());
    let reporter =
        TelemetryReporter::new(&reporter_config(&collector.url), "dev-b".to_string()).unwrap();

    PositionSampler::new(fast_sampler(4), provider)
        .run(|sample| reporter.report(&sample))
        .await
        .unwrap();

    collector.wait_for_requests(4).await;

    let bodies = collector.bodies();
    let first: TelemetryEnvelope = serde_json::from_str(&bodies[0]).unwrap();
    assert_eq!(first.device_id, "dev-b");
    // Every reported position came from the replayed route
    for body in &bodies {
        let envelope: TelemetryEnvelope = serde_json::from_str(body).unwrap();
        assert!((envelope.lat - 48.85).abs() < 0.1);
    }
}

// ============================================
// Identity across simulated restarts
// ============================================

#[test]
fn test_identity_survives_restart_and_differs_between_installations() {
    let dir = tempfile::tempdir().unwrap();
    let path_a = dir.path().join("install-a/identity.db");
    let path_b = dir.path().join("install-b/identity.db");

    let id_a = IdentityStore::open(&path_a)
        .unwrap()
        .get_or_create_device_id()
        .unwrap();
    let id_a_again = IdentityStore::open(&path_a)
        .unwrap()
        .get_or_create_device_id()
        .unwrap();
    let id_b = IdentityStore::open(&path_b)
        .unwrap()
        .get_or_create_device_id()
        .unwrap();

    assert_eq!(id_a, id_a_again);
    assert_ne!(id_a, id_b);
}

// ============================================
// Configuration paths
// ============================================

#[test]
fn test_xdg_paths_are_namespaced() {
    assert!(Config::identity_store_path().ends_with("geotrace/identity.db"));
    assert!(Config::log_path().ends_with("geotrace/geotrace.log"));
}
