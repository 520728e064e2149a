#![forbid(unsafe_code)]

//! `statlog` - Structured logging with per-call delivery telemetry.
//!
//! Each log call fans out to every configured sink and reports what happened:
//! - Multiple sinks (console, rotating file, syslog) behind one `Output` trait
//! - Per-sink failure isolation and attribution
//! - Call latency and free disk space on the log file's filesystem
//! - A background health monitor that checks the records actually reached the search backend
//! - Optional sequence numbering of records
//!
//! # Example
//!
//! ```
//! use statlog::{Attr, Level, Logger};
//!
//! let logger = Logger::builder()
//!     .level(Level::Debug)
//!     .console()
//!         .done()
//!     .build()
//!     .expect("console-only logger always builds");
//!
//! logger.info("Application started", &[Attr::string("component", "main")]);
//!
//! let stats = logger
//!     .log_stats(Level::Warn, "Connection timeout", &[Attr::int("retries", 3)])
//!     .expect("warn is enabled");
//! assert!(stats.errors.is_empty());
//! ```

pub mod cleanup;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod fmt;
pub mod health;
pub mod internal;
pub mod level;
pub mod logger;
pub mod output;
pub mod record;
pub mod sequence;
pub mod stats;
pub mod units;

// Re-exports for convenience
pub use cleanup::{CleanupResult, RetentionPolicy};
pub use config::{Config, ConfigOverrides};
pub use dispatch::{DispatchError, Dispatcher};
pub use error::Error;
pub use fmt::{Format, Formatter};
pub use health::{HealthCheckError, HealthCheckStatus, HealthMonitor, HealthSnapshot};
pub use level::{Level, Severity};
pub use logger::{LogContext, Logger, LoggerBuilder};
pub use output::{
    ConsoleOutput, ConsoleTarget, Facility, FileOutput, Network, Output, RotateOptions,
    RotatingWriter, SinkHandle, SinkKind, SyslogOptions, SyslogOutput,
};
pub use record::{Attr, LogRecord, Value};
pub use sequence::SequenceTagger;
pub use stats::{LogStats, StatsCallback, StatsCollector, StatsConfig};
pub use units::{format_duration, format_size, parse_duration};
