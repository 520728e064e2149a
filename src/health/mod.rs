//! Background health-check monitor.
//!
//! Two loops run on a dedicated thread: one periodically emits a liveness record through the
//! logger, the other periodically asks the search backend for the newest liveness record it
//! has indexed for this instance. The querier publishes its result into a `HealthSnapshot`
//! that every log call reads without blocking.

mod query;

use crate::config::HealthCheckConfig;
use crate::internal;
use crate::level::Level;
use crate::logger::Logger;
use crate::record::Attr;
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use query::Querier;
use tokio::sync::watch;
use tokio::task;
use tokio::time::{self, Instant, MissedTickBehavior};

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Message of the periodic liveness record; the backend query filters on it.
pub const LIVENESS_MESSAGE: &str = "Health check log";

const COMPONENT: &str = "healthcheck";

/// Upper bound for a single backend request.
const MAX_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Why the last backend query failed. Stored in the snapshot, so it is a plain value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthCheckError {
    /// Transport-level failure (connection refused, DNS, TLS).
    Request(String),
    /// The request did not complete within its timeout.
    Timeout,
    /// The backend answered with a non-success status.
    Status { status: u16, body: String },
    /// The response body was not the expected JSON.
    Decode(String),
    /// No liveness record for this instance has been indexed yet.
    NoResults,
    /// The indexed timestamp is not RFC 3339.
    Timestamp(String),
    /// The monitor could not start its runtime or HTTP client.
    Startup(String),
}

impl fmt::Display for HealthCheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(e) => write!(f, "failed to execute search query: {e}"),
            Self::Timeout => f.write_str("search query timed out"),
            Self::Status { status, body } => write!(f, "search query failed: {status} {body}"),
            Self::Decode(e) => write!(f, "failed to decode search response: {e}"),
            Self::NoResults => f.write_str("no health check logs found"),
            Self::Timestamp(e) => write!(f, "failed to parse timestamp: {e}"),
            Self::Startup(e) => write!(f, "health monitor failed to start: {e}"),
        }
    }
}

impl std::error::Error for HealthCheckError {}

/// Newest backend-confirmed liveness timestamp and the outcome of the last query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheckStatus {
    pub timestamp: DateTime<Utc>,
    pub error: Option<HealthCheckError>,
}

impl HealthCheckStatus {
    #[must_use]
    pub fn now() -> Self {
        Self {
            timestamp: Utc::now(),
            error: None,
        }
    }

    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

impl Default for HealthCheckStatus {
    fn default() -> Self {
        Self::now()
    }
}

/// Shared, lock-free slot holding the current `HealthCheckStatus`.
///
/// Clones observe the same slot. Readers never block writers; a store replaces the whole value.
#[derive(Debug, Clone)]
pub struct HealthSnapshot {
    slot: Arc<ArcSwap<HealthCheckStatus>>,
}

impl Default for HealthSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthSnapshot {
    /// Starts out healthy as of now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Arc::new(ArcSwap::from_pointee(HealthCheckStatus::now())),
        }
    }

    #[must_use]
    pub fn load(&self) -> HealthCheckStatus {
        HealthCheckStatus::clone(&self.slot.load())
    }

    pub fn store(&self, status: HealthCheckStatus) {
        self.slot.store(Arc::new(status));
    }
}

struct Running {
    shutdown: watch::Sender<bool>,
    thread: JoinHandle<()>,
}

/// Owns the monitor thread. Dropping the monitor stops it.
pub struct HealthMonitor {
    logger: Logger,
    config: HealthCheckConfig,
    log_interval: Duration,
    query_interval: Duration,
    instance_id: String,
    running: Mutex<Option<Running>>,
}

impl HealthMonitor {
    /// Assigns a fresh instance id; nothing runs until `start`.
    ///
    /// # Errors
    /// Unparsable or zero periodicities.
    pub fn new(logger: Logger, config: HealthCheckConfig) -> Result<Self, crate::Error> {
        let log_interval = config.log_interval()?;
        let query_interval = config.query_interval()?;
        Ok(Self {
            logger,
            config,
            log_interval,
            query_interval,
            instance_id: ulid::Ulid::new().to_string(),
            running: Mutex::new(None),
        })
    }

    /// Value of the `instance_uuid` attribute on every liveness record.
    #[must_use]
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    #[must_use]
    pub fn snapshot(&self) -> HealthSnapshot {
        self.logger.health_snapshot()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|r| !r.thread.is_finished())
    }

    /// Spawns the monitor thread. Later calls while it is running do nothing.
    ///
    /// A failure to build the HTTP client or the thread is logged and leaves the monitor
    /// stopped.
    pub fn start(&self) {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running.is_some() {
            return;
        }

        let timeout = self.query_interval.min(MAX_REQUEST_TIMEOUT);
        let querier = match Querier::new(
            &self.config.elasticsearch_url,
            &self.config.elasticsearch_index,
            &self.instance_id,
            timeout,
        ) {
            Ok(querier) => querier,
            Err(e) => {
                self.log_startup_failure(&e.to_string());
                return;
            }
        };

        let (shutdown, shutdown_rx) = watch::channel(false);
        let tasks = Tasks {
            logger: self.logger.clone(),
            snapshot: self.logger.health_snapshot(),
            instance_id: self.instance_id.clone(),
            log_interval: self.log_interval,
            query_interval: self.query_interval,
        };

        let spawned = thread::Builder::new()
            .name("statlog-health".into())
            .spawn(move || tasks.run(querier, shutdown_rx));

        match spawned {
            Ok(thread) => {
                self.logger.log(
                    Level::Debug,
                    "Starting health check monitoring",
                    &[
                        Attr::string("component", COMPONENT),
                        Attr::string("instance_uuid", &self.instance_id),
                    ],
                );
                *running = Some(Running { shutdown, thread });
            }
            Err(e) => self.log_startup_failure(&e.to_string()),
        }
    }

    /// Signals both loops and waits for the thread. Safe to call repeatedly.
    pub fn stop(&self) {
        let taken = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(Running { shutdown, thread }) = taken {
            let _ = shutdown.send(true);
            if thread.join().is_err() {
                internal::error("HEALTH", "Health monitor thread panicked");
            }
            internal::debug("HEALTH", "Health monitor stopped");
        }
    }

    fn log_startup_failure(&self, error: &str) {
        self.logger.log(
            Level::Error,
            "Failed to initialize search client",
            &[
                Attr::string("component", COMPONENT),
                Attr::string("error", error),
                Attr::string("instance_uuid", &self.instance_id),
            ],
        );
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for HealthMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthMonitor")
            .field("instance_id", &self.instance_id)
            .field("log_interval", &self.log_interval)
            .field("query_interval", &self.query_interval)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

/// Everything the monitor thread owns.
struct Tasks {
    logger: Logger,
    snapshot: HealthSnapshot,
    instance_id: String,
    log_interval: Duration,
    query_interval: Duration,
}

impl Tasks {
    fn run(self, querier: Querier, shutdown: watch::Receiver<bool>) {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                let error = HealthCheckError::Startup(e.to_string());
                internal::error("HEALTH", &error.to_string());
                return;
            }
        };

        let this = Arc::new(self);
        runtime.block_on(async move {
            let liveness = tokio::spawn(Arc::clone(&this).liveness_loop(shutdown.clone()));
            let backend = tokio::spawn(Arc::clone(&this).query_loop(querier, shutdown));
            let (liveness, backend) = tokio::join!(liveness, backend);
            if liveness.is_err() || backend.is_err() {
                internal::error("HEALTH", "Health monitor task panicked");
            }
        });

        // A log call stuck in a sink must not hold up `stop`
        runtime.shutdown_background();
    }

    /// Runs `emit` on the blocking pool, so a stalled sink delays only the loop that logged.
    fn log_blocking(
        self: &Arc<Self>,
        emit: impl FnOnce(&Self) + Send + 'static,
    ) -> task::JoinHandle<()> {
        let this = Arc::clone(self);
        task::spawn_blocking(move || emit(&this))
    }

    async fn liveness_loop(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = time::interval_at(Instant::now() + self.log_interval, self.log_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }

            let tick = Utc::now();
            let emit = self.log_blocking(move |this| this.emit_liveness(tick));
            tokio::select! {
                _ = emit => {}
                _ = shutdown.changed() => break,
            }
        }

        self.logger.log(
            Level::Info,
            "Health check liveness loop exiting",
            &[Attr::string("instance_uuid", &self.instance_id)],
        );
    }

    fn emit_liveness(&self, tick: DateTime<Utc>) {
        let status = self.snapshot.load();
        let mut attrs = vec![
            Attr::string("component", COMPONENT),
            Attr::time("timestamp", tick),
            Attr::time("last_received", status.timestamp),
            Attr::string("instance_uuid", &self.instance_id),
        ];
        let level = match status.error {
            None => Level::Info,
            Some(ref error) => {
                attrs.push(Attr::string("error", error.to_string()));
                Level::Warn
            }
        };
        self.logger.log(level, LIVENESS_MESSAGE, &attrs);
    }

    async fn query_loop(self: Arc<Self>, querier: Querier, mut shutdown: watch::Receiver<bool>) {
        let mut ticker =
            time::interval_at(Instant::now() + self.query_interval, self.query_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }

            let result = tokio::select! {
                result = querier.fetch_last_timestamp() => result,
                _ = shutdown.changed() => break,
            };
            let report = self.record_query(result);
            tokio::select! {
                _ = report => {}
                _ = shutdown.changed() => break,
            }
        }

        self.logger.log(
            Level::Info,
            "Health check query loop exiting",
            &[Attr::string("instance_uuid", &self.instance_id)],
        );
    }

    /// Publishes the outcome right away; only the log line goes through the blocking pool.
    fn record_query(
        self: &Arc<Self>,
        result: Result<DateTime<Utc>, HealthCheckError>,
    ) -> task::JoinHandle<()> {
        match result {
            Ok(timestamp) => {
                self.snapshot.store(HealthCheckStatus {
                    timestamp,
                    error: None,
                });
                self.log_blocking(move |this| {
                    this.logger.log(
                        Level::Debug,
                        "Successfully retrieved last health check timestamp",
                        &[
                            Attr::string("component", COMPONENT),
                            Attr::string("instance_uuid", &this.instance_id),
                            Attr::time("last_timestamp", timestamp),
                        ],
                    );
                })
            }
            Err(error) => {
                let previous = self.snapshot.load().timestamp;
                let message = error.to_string();
                self.snapshot.store(HealthCheckStatus {
                    timestamp: previous,
                    error: Some(error),
                });
                self.log_blocking(move |this| {
                    this.logger.log(
                        Level::Error,
                        "Failed to fetch last log timestamp",
                        &[
                            Attr::string("component", COMPONENT),
                            Attr::string("error", message),
                            Attr::string("instance_uuid", &this.instance_id),
                        ],
                    );
                })
            }
        }
    }
}
