//! The application-facing logging service.
//!
//! A `Logger` owns the sequence tagger, the stats collector (and through it the dispatcher and
//! every sink) and the health snapshot. It is cheap to clone; clones and derived loggers share
//! sinks, numbering, latest stats and the stats callback.

mod builder;
mod context;
mod from_config;

pub use builder::{ConsoleBuilder, FileBuilder, LoggerBuilder, SyslogBuilder};
pub use context::LogContext;

use crate::config::HealthCheckConfig;
use crate::error::Error;
use crate::health::{HealthMonitor, HealthSnapshot};
use crate::level::Level;
use crate::output::{Output, SinkKind};
use crate::record::{Attr, LogRecord};
use crate::sequence::SequenceTagger;
use crate::stats::{LogStats, StatsCollector};
use std::fmt;

#[derive(Clone)]
pub struct Logger {
    collector: StatsCollector,
    sequence: Option<SequenceTagger>,
}

impl Logger {
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Whether any sink would accept a record at `level`.
    #[must_use]
    pub fn enabled(&self, level: Level) -> bool {
        self.collector.enabled(level)
    }

    /// Filters, numbers and dispatches one record. `None` when no sink wants the level.
    fn emit(&self, level: Level, msg: &str, attrs: &[Attr]) -> Option<(Result<(), Error>, LogStats)> {
        if !self.enabled(level) {
            return None;
        }
        let mut record = LogRecord::new(level, msg).with_attrs(attrs.iter().cloned());
        if let Some(ref sequence) = self.sequence {
            sequence.tag(&mut record);
        }
        Some(self.collector.handle_with_stats(&record))
    }

    /// Sink failures are not returned; they are in the call's stats (see `latest_stats`).
    pub fn log(&self, level: Level, msg: &str, attrs: &[Attr]) {
        let _ = self.emit(level, msg, attrs);
    }

    /// Same as `log`, returning this call's stats. `None` if the level was filtered out.
    pub fn log_stats(&self, level: Level, msg: &str, attrs: &[Attr]) -> Option<LogStats> {
        self.emit(level, msg, attrs).map(|(_, stats)| stats)
    }

    /// Same as `log`, returning the aggregate sink error.
    ///
    /// # Errors
    /// `Error::Joined` over every sink that failed. A filtered record is `Ok`.
    pub fn try_log(&self, level: Level, msg: &str, attrs: &[Attr]) -> Result<(), Error> {
        self.emit(level, msg, attrs).map_or(Ok(()), |(result, _)| result)
    }

    /// Logs with the context's attributes ahead of `attrs`.
    pub fn log_ctx(&self, ctx: &LogContext, level: Level, msg: &str, attrs: &[Attr]) {
        if ctx.is_empty() {
            self.log(level, msg, attrs);
            return;
        }
        let mut all = ctx.attrs();
        all.extend_from_slice(attrs);
        self.log(level, msg, &all);
    }

    pub fn debug(&self, msg: &str, attrs: &[Attr]) {
        self.log(Level::Debug, msg, attrs);
    }

    pub fn info(&self, msg: &str, attrs: &[Attr]) {
        self.log(Level::Info, msg, attrs);
    }

    pub fn warn(&self, msg: &str, attrs: &[Attr]) {
        self.log(Level::Warn, msg, attrs);
    }

    pub fn error(&self, msg: &str, attrs: &[Attr]) {
        self.log(Level::Error, msg, attrs);
    }

    /// Logs at Error with `fatal=true`, flushes every sink and exits with status 1.
    pub fn fatal(&self, msg: &str, attrs: &[Attr]) -> ! {
        let mut all = attrs.to_vec();
        all.push(Attr::bool("fatal", true));
        self.log(Level::Error, msg, &all);
        let _ = self.flush();
        std::process::exit(1)
    }

    /// A logger whose records carry `attrs`; `self` is unaffected.
    #[must_use]
    pub fn with_attrs(&self, attrs: &[Attr]) -> Self {
        Self {
            collector: self.collector.derive_attrs(attrs),
            sequence: self.sequence.clone(),
        }
    }

    /// A logger that nests subsequent attributes under `name`; `self` is unaffected.
    #[must_use]
    pub fn with_group(&self, name: &str) -> Self {
        Self {
            collector: self.collector.derive_group(name),
            sequence: self.sequence.clone(),
        }
    }

    /// Replaces the stats callback for this logger and every logger it shares sinks with.
    pub fn set_stats_callback(&self, callback: impl Fn(&LogStats) + Send + Sync + 'static) {
        self.collector.set_stats_callback(callback);
    }

    pub fn clear_stats_callback(&self) {
        self.collector.clear_stats_callback();
    }

    #[must_use]
    pub fn latest_stats(&self) -> Option<LogStats> {
        self.collector.latest_stats()
    }

    /// The slot the health monitor publishes into and every log call reads.
    #[must_use]
    pub fn health_snapshot(&self) -> HealthSnapshot {
        self.collector.health().clone()
    }

    /// Creates and starts a monitor that reports through this logger.
    ///
    /// # Errors
    /// Unparsable or zero periodicities.
    pub fn start_health_monitor(
        &self,
        config: &HealthCheckConfig,
    ) -> Result<HealthMonitor, Error> {
        let monitor = HealthMonitor::new(self.clone(), config.clone())?;
        monitor.start();
        Ok(monitor)
    }

    /// # Errors
    /// Every sink that failed to flush, joined.
    pub fn flush(&self) -> Result<(), Error> {
        self.collector.flush()
    }

    #[must_use]
    pub fn sink_kinds(&self) -> Vec<SinkKind> {
        self.collector.dispatcher().sink_kinds()
    }

    #[must_use]
    pub const fn stats_collector(&self) -> &StatsCollector {
        &self.collector
    }

    #[must_use]
    pub const fn sequence(&self) -> Option<&SequenceTagger> {
        self.sequence.as_ref()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("sinks", &self.sink_kinds())
            .field("sequence", &self.sequence.is_some())
            .finish_non_exhaustive()
    }
}
