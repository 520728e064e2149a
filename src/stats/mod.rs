//! Per-call telemetry around the fan-out.
//!
//! `StatsCollector` times each dispatch, measures free space on the file sink's filesystem,
//! attaches the current health-check status, keeps the result as the latest `LogStats`, and
//! hands it to the registered callback.
//!
//! The disk query is a blocking `statvfs` on every call while file output is enabled. That
//! cost lands on the logging thread and shows up in `LogStats::duration`.

pub mod disk;

pub use disk::available_bytes;

use crate::dispatch::{self, DispatchError, Dispatcher};
use crate::error::Error;
use crate::health::{HealthCheckStatus, HealthSnapshot};
use crate::level::Level;
use crate::output::{Output, SinkKind};
use crate::record::{Attr, LogRecord};
use arc_swap::ArcSwapOption;

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

/// Telemetry for one top-level log call.
#[derive(Debug, Clone)]
pub struct LogStats {
    /// Fan-out plus disk query.
    pub duration: Duration,
    /// Free bytes on the file sink's filesystem; zero when file output is off or the query failed.
    pub disk_avail: u64,
    /// Sink failures in sink order, then the disk-query failure (if any) unattributed.
    pub errors: Vec<DispatchError>,
    pub health_check: HealthCheckStatus,
}

impl LogStats {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Failures attributed to the given sink kind.
    pub fn errors_for<'a>(&'a self, kind: &'a SinkKind) -> impl Iterator<Item = &'a DispatchError> {
        self.errors.iter().filter(move |e| e.kind() == Some(kind))
    }

    /// Failures not tied to a sink (the disk-space query).
    pub fn unattributed_errors(&self) -> impl Iterator<Item = &DispatchError> {
        self.errors.iter().filter(|e| e.sink.is_none())
    }
}

/// Receives every `LogStats` on the logging thread.
pub type StatsCallback = Arc<dyn Fn(&LogStats) + Send + Sync>;

/// What the collector needs to know about file output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsConfig {
    pub file_enabled: bool,
    pub file_path: PathBuf,
}

impl StatsConfig {
    #[must_use]
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            file_enabled: true,
            file_path: path.into(),
        }
    }
}

/// Latest-stats slot and callback registration, shared by a collector and everything derived
/// from it.
#[derive(Default)]
struct Shared {
    latest: ArcSwapOption<LogStats>,
    callback: RwLock<Option<StatsCallback>>,
}

#[derive(Clone)]
pub struct StatsCollector {
    dispatcher: Dispatcher,
    config: Arc<StatsConfig>,
    health: HealthSnapshot,
    shared: Arc<Shared>,
}

impl StatsCollector {
    #[must_use]
    pub fn new(dispatcher: Dispatcher, config: StatsConfig, health: HealthSnapshot) -> Self {
        Self {
            dispatcher,
            config: Arc::new(config),
            health,
            shared: Arc::new(Shared::default()),
        }
    }

    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    #[must_use]
    pub fn config(&self) -> &StatsConfig {
        &self.config
    }

    #[must_use]
    pub const fn health(&self) -> &HealthSnapshot {
        &self.health
    }

    /// Dispatches `record` and returns the aggregate sink error together with this call's stats.
    ///
    /// The disk-query failure is reported in the stats only, never in the returned error.
    pub fn handle_with_stats(&self, record: &LogRecord) -> (Result<(), Error>, LogStats) {
        let start = Instant::now();
        let mut errors = self.dispatcher.dispatch(record);

        let mut disk_avail = 0;
        if self.config.file_enabled {
            match available_bytes(&self.config.file_path) {
                Ok(avail) => disk_avail = avail,
                Err(e) => errors.push(DispatchError::new(e, record, None)),
            }
        }

        let duration = start.elapsed();
        let result = dispatch::joined(&errors);
        let stats = LogStats {
            duration,
            disk_avail,
            errors,
            health_check: self.health.load(),
        };

        self.shared.latest.store(Some(Arc::new(stats.clone())));
        let callback = self
            .shared
            .callback
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(callback) = callback {
            callback(&stats);
        }

        (result, stats)
    }

    /// Stats of the most recent call through this collector or any derived from it.
    #[must_use]
    pub fn latest_stats(&self) -> Option<LogStats> {
        self.shared.latest.load_full().map(|s| LogStats::clone(&s))
    }

    /// Replaces the callback; there is only ever one.
    pub fn set_stats_callback(&self, callback: impl Fn(&LogStats) + Send + Sync + 'static) {
        *self
            .shared
            .callback
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(callback));
    }

    pub fn clear_stats_callback(&self) {
        *self
            .shared
            .callback
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Collector over a derived dispatcher that shares this one's stats slot and callback.
    #[must_use]
    pub fn derive_attrs(&self, attrs: &[Attr]) -> Self {
        self.derive(self.dispatcher.derive_attrs(attrs))
    }

    #[must_use]
    pub fn derive_group(&self, name: &str) -> Self {
        self.derive(self.dispatcher.derive_group(name))
    }

    fn derive(&self, dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            config: Arc::clone(&self.config),
            health: self.health.clone(),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Output for StatsCollector {
    fn enabled(&self, level: Level) -> bool {
        self.dispatcher.enabled(level)
    }

    fn handle(&self, record: &LogRecord) -> Result<(), Error> {
        self.handle_with_stats(record).0
    }

    fn with_attrs(&self, attrs: &[Attr]) -> Arc<dyn Output> {
        Arc::new(self.derive_attrs(attrs))
    }

    fn with_group(&self, name: &str) -> Arc<dyn Output> {
        Arc::new(self.derive_group(name))
    }

    fn flush(&self) -> Result<(), Error> {
        self.dispatcher.flush()
    }
}

impl fmt::Debug for StatsCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatsCollector")
            .field("dispatcher", &self.dispatcher)
            .field("config", &self.config)
            .field("health", &self.health)
            .finish_non_exhaustive()
    }
}
