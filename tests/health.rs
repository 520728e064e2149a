//! Health monitor tests against a minimal in-process search backend.

use chrono::{DateTime, Utc};
use statlog::config::HealthCheckConfig;
use statlog::health::LIVENESS_MESSAGE;
use statlog::{
    Attr, Error, HealthCheckError, HealthMonitor, Level, LogRecord, Logger, Output, SinkKind,
};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::tempdir;

const WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
struct Request {
    target: String,
    body: String,
}

/// Answers every request with the same status and body, recording what it was sent.
struct MockBackend {
    url: String,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl MockBackend {
    fn start(status: u16, body: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let Some(request) = read_request(&mut stream) else {
                    continue;
                };
                seen.lock().unwrap().push(request);
                let response = format!(
                    "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });

        Self { url, requests }
    }

    fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

fn read_request(stream: &mut std::net::TcpStream) -> Option<Request> {
    let mut reader = BufReader::new(stream.try_clone().ok()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let target = request_line.split_whitespace().nth(1)?.to_string();

    let mut content_length = 0;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).ok()?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':')
            && name.eq_ignore_ascii_case("content-length")
        {
            content_length = value.trim().parse().ok()?;
        }
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).ok()?;
    Some(Request {
        target,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

/// Stalls on liveness records only, like a wedged syslog daemon would.
struct StallingOutput {
    stall: Duration,
}

impl Output for StallingOutput {
    fn enabled(&self, _level: Level) -> bool {
        true
    }

    fn handle(&self, record: &LogRecord) -> Result<(), Error> {
        if record.message == LIVENESS_MESSAGE {
            thread::sleep(self.stall);
        }
        Ok(())
    }

    fn with_attrs(&self, _attrs: &[Attr]) -> Arc<dyn Output> {
        Arc::new(Self { stall: self.stall })
    }

    fn with_group(&self, _name: &str) -> Arc<dyn Output> {
        Arc::new(Self { stall: self.stall })
    }
}

fn config(url: &str, log: &str, query: &str) -> HealthCheckConfig {
    HealthCheckConfig {
        enabled: true,
        log_periodicity: log.to_string(),
        elasticsearch_periodicity: query.to_string(),
        elasticsearch_index: "logs".to_string(),
        elasticsearch_url: url.to_string(),
    }
}

fn file_logger(path: &Path) -> Logger {
    Logger::builder()
        .level(Level::Debug)
        .file()
        .path(path)
        .done()
        .build()
        .unwrap()
}

fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

#[test]
fn successful_query_updates_snapshot() {
    let backend = MockBackend::start(
        200,
        r#"{"hits":{"hits":[{"_source":{"timestamp":"2024-05-06T07:08:09.123Z"}}]}}"#,
    );
    let dir = tempdir().unwrap();
    let logger = file_logger(&dir.path().join("out.log"));

    let monitor = logger
        .start_health_monitor(&config(&backend.url, "1h", "50ms"))
        .unwrap();
    assert!(monitor.is_running());

    let expected: DateTime<Utc> = "2024-05-06T07:08:09.123Z".parse().unwrap();
    assert!(wait_for(|| logger.health_snapshot().load().timestamp == expected));
    assert!(logger.health_snapshot().load().is_ok());

    let stats = logger.log_stats(Level::Info, "after query", &[]).unwrap();
    assert_eq!(stats.health_check.timestamp, expected);

    monitor.stop();

    let requests = backend.requests();
    assert!(!requests.is_empty());
    assert_eq!(
        requests[0].target,
        "/logs/_search?filter_path=hits.hits._source.timestamp"
    );
    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body["size"], 1);
    let must = body["query"]["bool"]["must"].as_array().unwrap();
    assert_eq!(
        must[0]["term"]["instance_uuid.keyword"],
        monitor.instance_id()
    );
    assert_eq!(must[1]["term"]["msg.keyword"], LIVENESS_MESSAGE);
}

#[test]
fn failed_query_keeps_previous_timestamp() {
    let backend = MockBackend::start(500, r#"{"error":"shard failure"}"#);
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.log");
    let logger = file_logger(&path);
    let before = logger.health_snapshot().load().timestamp;

    let monitor = logger
        .start_health_monitor(&config(&backend.url, "1h", "50ms"))
        .unwrap();

    assert!(wait_for(|| logger.health_snapshot().load().error.is_some()));
    monitor.stop();

    let status = logger.health_snapshot().load();
    assert_eq!(status.timestamp, before);
    assert_eq!(
        status.error,
        Some(HealthCheckError::Status {
            status: 500,
            body: r#"{"error":"shard failure"}"#.to_string(),
        })
    );

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("Failed to fetch last log timestamp"));
}

#[test]
fn empty_result_is_no_results() {
    let backend = MockBackend::start(200, "{}");
    let dir = tempdir().unwrap();
    let logger = file_logger(&dir.path().join("out.log"));

    let monitor = logger
        .start_health_monitor(&config(&backend.url, "1h", "50ms"))
        .unwrap();
    assert!(wait_for(|| logger.health_snapshot().load().error.is_some()));
    monitor.stop();

    assert_eq!(
        logger.health_snapshot().load().error,
        Some(HealthCheckError::NoResults)
    );
}

#[test]
fn unreachable_backend_is_a_request_error() {
    // Bind then drop to get a port nothing listens on
    let url = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };
    let dir = tempdir().unwrap();
    let logger = file_logger(&dir.path().join("out.log"));

    let monitor = logger
        .start_health_monitor(&config(&url, "1h", "50ms"))
        .unwrap();
    assert!(wait_for(|| logger.health_snapshot().load().error.is_some()));
    monitor.stop();

    assert!(matches!(
        logger.health_snapshot().load().error,
        Some(HealthCheckError::Request(_) | HealthCheckError::Timeout)
    ));
}

#[test]
fn stalled_liveness_sink_does_not_block_queries() {
    let logger = Logger::builder()
        .output(
            SinkKind::Custom("stalling".to_string()),
            StallingOutput {
                stall: Duration::from_millis(1500),
            },
        )
        .build()
        .unwrap();

    // Port 1 refuses connections immediately
    let monitor = logger
        .start_health_monitor(&config("http://127.0.0.1:1", "20ms", "100ms"))
        .unwrap();

    let deadline = Instant::now() + Duration::from_millis(700);
    let mut recorded = false;
    while Instant::now() < deadline {
        if logger.health_snapshot().load().error.is_some() {
            recorded = true;
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }
    assert!(recorded, "query result was not stored while liveness logging stalled");

    let started = Instant::now();
    monitor.stop();
    assert!(started.elapsed() < Duration::from_millis(500), "{:?}", started.elapsed());
}

#[test]
fn liveness_records_are_emitted() {
    let backend = MockBackend::start(200, "{}");
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.log");
    let logger = file_logger(&path);

    let monitor = logger
        .start_health_monitor(&config(&backend.url, "50ms", "1h"))
        .unwrap();
    let instance = monitor.instance_id().to_string();

    assert!(wait_for(|| {
        std::fs::read_to_string(&path).is_ok_and(|s| s.contains(LIVENESS_MESSAGE))
    }));
    monitor.stop();

    let written = std::fs::read_to_string(&path).unwrap();
    let liveness: serde_json::Value = written
        .lines()
        .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap())
        .find(|v| v["msg"] == LIVENESS_MESSAGE)
        .unwrap();
    assert_eq!(liveness["level"], "INFO");
    assert_eq!(liveness["component"], "healthcheck");
    assert_eq!(liveness["instance_uuid"], instance.as_str());
    assert!(liveness["timestamp"].as_str().unwrap().parse::<DateTime<Utc>>().is_ok());
    assert!(liveness["last_received"].is_string());

    assert!(written.contains("Health check liveness loop exiting"));
    assert!(written.contains("Health check query loop exiting"));
}

#[test]
fn stop_returns_promptly_with_long_periods() {
    let dir = tempdir().unwrap();
    let logger = file_logger(&dir.path().join("out.log"));
    let monitor = logger
        .start_health_monitor(&config("http://127.0.0.1:9", "1h", "1h"))
        .unwrap();

    let started = Instant::now();
    monitor.stop();
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(!monitor.is_running());

    // A second stop is harmless
    monitor.stop();
}

#[test]
fn start_is_idempotent() {
    let dir = tempdir().unwrap();
    let logger = file_logger(&dir.path().join("out.log"));
    let monitor =
        HealthMonitor::new(logger.clone(), config("http://127.0.0.1:9", "1h", "1h")).unwrap();

    assert!(!monitor.is_running());
    monitor.start();
    monitor.start();
    assert!(monitor.is_running());
    drop(monitor);
}

#[test]
fn instance_ids_are_unique() {
    let logger = Logger::builder().console().done().build().unwrap();
    let cfg = config("http://127.0.0.1:9", "1h", "1h");
    let a = HealthMonitor::new(logger.clone(), cfg.clone()).unwrap();
    let b = HealthMonitor::new(logger, cfg).unwrap();
    assert_ne!(a.instance_id(), b.instance_id());
    assert_eq!(a.instance_id().len(), 26);
}

#[test]
fn invalid_periodicity_is_rejected() {
    let logger = Logger::builder().console().done().build().unwrap();
    assert!(HealthMonitor::new(logger.clone(), config("http://x", "0s", "1m")).is_err());
    assert!(HealthMonitor::new(logger, config("http://x", "30s", "soon")).is_err());
}
