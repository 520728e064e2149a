//! Stepwise construction of a `Logger`. Each built-in sink has a sub-builder that returns to
//! the parent with `done()`; `build()` wires every sink into one dispatcher.

use super::Logger;
use crate::cleanup::RetentionPolicy;
use crate::dispatch::Dispatcher;
use crate::fmt::Format;
use crate::health::HealthSnapshot;
use crate::internal;
use crate::level::Level;
use crate::output::{
    ConsoleOutput, ConsoleTarget, Facility, FileOutput, Network, Output, RotateOptions,
    SinkHandle, SinkKind, SyslogOptions, SyslogOutput,
};
use crate::sequence::SequenceTagger;
use crate::stats::{StatsCollector, StatsConfig};

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

/// Sinks are kept as specs until `build()`, so `level()` applies no matter where it is called.
enum PendingSink {
    Console {
        output: ConsoleOutput,
        level: Option<Level>,
    },
    File {
        path: PathBuf,
        options: RotateOptions,
        format: Format,
        level: Option<Level>,
    },
    Syslog {
        options: SyslogOptions,
        level: Option<Level>,
    },
    Custom {
        kind: SinkKind,
        output: Arc<dyn Output>,
    },
}

pub struct LoggerBuilder {
    min_level: Level,
    sinks: Vec<PendingSink>,
    sequence: bool,
    health: Option<HealthSnapshot>,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggerBuilder {
    /// Info is the default minimum level; Debug is opt-in.
    #[must_use]
    pub fn new() -> Self {
        Self {
            min_level: Level::Info,
            sinks: Vec::new(),
            sequence: false,
            health: None,
        }
    }

    /// Minimum level for every built-in sink that doesn't set its own.
    #[must_use]
    pub const fn level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Number every record with a `sequence_no` attribute.
    #[must_use]
    pub const fn sequence(mut self, enabled: bool) -> Self {
        self.sequence = enabled;
        self
    }

    /// Reads health status from an existing snapshot instead of a fresh one.
    #[must_use]
    pub fn health_snapshot(mut self, snapshot: HealthSnapshot) -> Self {
        self.health = Some(snapshot);
        self
    }

    #[must_use]
    pub fn console(self) -> ConsoleBuilder {
        ConsoleBuilder {
            parent: self,
            output: ConsoleOutput::new(),
            level: None,
        }
    }

    #[must_use]
    pub fn file(self) -> FileBuilder {
        FileBuilder {
            parent: self,
            path: PathBuf::new(),
            options: RotateOptions::default(),
            format: Format::Json,
            level: None,
        }
    }

    #[must_use]
    pub fn syslog(self) -> SyslogBuilder {
        SyslogBuilder {
            parent: self,
            options: SyslogOptions::default(),
            level: None,
        }
    }

    /// Registers a caller-supplied sink. Its own `enabled` decides which levels it sees.
    #[must_use]
    pub fn output(mut self, kind: SinkKind, output: impl Output + 'static) -> Self {
        self.sinks.push(PendingSink::Custom {
            kind,
            output: Arc::new(output),
        });
        self
    }

    /// # Errors
    /// A file sink without a path, or a syslog daemon that cannot be reached.
    pub fn build(self) -> Result<Logger, crate::Error> {
        let min_level = self.min_level;
        let mut handles = Vec::with_capacity(self.sinks.len().max(1));
        let mut stats_config = StatsConfig::default();

        for sink in self.sinks {
            let handle = match sink {
                PendingSink::Console { output, level } => SinkHandle::new(
                    SinkKind::Console,
                    Arc::new(output.level(level.unwrap_or(min_level))),
                ),
                PendingSink::File {
                    path,
                    options,
                    format,
                    level,
                } => {
                    if path.as_os_str().is_empty() {
                        return Err(crate::Error::Config(
                            "file output requires a path".to_string(),
                        ));
                    }
                    if !stats_config.file_enabled {
                        stats_config = StatsConfig::with_file(&path);
                    }
                    let output = FileOutput::new(path, options)
                        .format(format)
                        .level(level.unwrap_or(min_level));
                    SinkHandle::new(SinkKind::File, Arc::new(output))
                }
                PendingSink::Syslog { mut options, level } => {
                    options.level = level.unwrap_or(min_level);
                    SinkHandle::new(SinkKind::Syslog, Arc::new(SyslogOutput::connect(&options)?))
                }
                PendingSink::Custom { kind, output } => SinkHandle::new(kind, output),
            };
            handles.push(handle);
        }

        if handles.is_empty() {
            internal::warn("LOGGER", "No outputs enabled, falling back to console");
            handles.push(SinkHandle::new(
                SinkKind::Console,
                Arc::new(ConsoleOutput::new().level(min_level)),
            ));
        }

        internal::debug(
            "LOGGER",
            &format!(
                "Outputs enabled: [{}]",
                handles
                    .iter()
                    .map(|h| h.kind().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        );

        let collector = StatsCollector::new(
            Dispatcher::new(handles),
            stats_config,
            self.health.unwrap_or_default(),
        );
        Ok(Logger {
            collector,
            sequence: self.sequence.then(SequenceTagger::new),
        })
    }
}

pub struct ConsoleBuilder {
    parent: LoggerBuilder,
    output: ConsoleOutput,
    level: Option<Level>,
}

impl ConsoleBuilder {
    #[must_use]
    pub fn format(mut self, format: Format) -> Self {
        self.output = self.output.format(format);
        self
    }

    #[must_use]
    pub fn target(mut self, target: ConsoleTarget) -> Self {
        self.output = self.output.target(target);
        self
    }

    /// Sends lines to an arbitrary writer (a test buffer, a pipe).
    #[must_use]
    pub fn writer(self, writer: impl Write + Send + 'static) -> Self {
        self.target(ConsoleTarget::writer(writer))
    }

    #[must_use]
    pub const fn level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Sub-builder consumes self, so there must be a way back to chain more outputs.
    #[must_use]
    pub fn done(mut self) -> LoggerBuilder {
        self.parent.sinks.push(PendingSink::Console {
            output: self.output,
            level: self.level,
        });
        self.parent
    }
}

pub struct FileBuilder {
    parent: LoggerBuilder,
    path: PathBuf,
    options: RotateOptions,
    format: Format,
    level: Option<Level>,
}

impl FileBuilder {
    #[must_use]
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    #[must_use]
    pub const fn rotate(mut self, options: RotateOptions) -> Self {
        self.options = options;
        self
    }

    /// Zero disables rotation.
    #[must_use]
    pub const fn max_size_mb(mut self, mb: u64) -> Self {
        self.options.max_size_mb = mb;
        self
    }

    #[must_use]
    pub const fn retention(mut self, retention: RetentionPolicy) -> Self {
        self.options.retention = retention;
        self
    }

    /// JSON lines unless set otherwise.
    #[must_use]
    pub const fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub const fn level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Sub-builder consumes self, so there must be a way back to chain more outputs.
    #[must_use]
    pub fn done(mut self) -> LoggerBuilder {
        self.parent.sinks.push(PendingSink::File {
            path: self.path,
            options: self.options,
            format: self.format,
            level: self.level,
        });
        self.parent
    }
}

pub struct SyslogBuilder {
    parent: LoggerBuilder,
    options: SyslogOptions,
    level: Option<Level>,
}

impl SyslogBuilder {
    /// Replaces the connection settings. `options.level` is ignored here: the sink takes
    /// `level` if set, otherwise the builder's level.
    #[must_use]
    pub fn options(mut self, options: SyslogOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub const fn network(mut self, network: Network) -> Self {
        self.options.network = network;
        self
    }

    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.options.address = address.into();
        self
    }

    #[must_use]
    pub const fn facility(mut self, facility: Facility) -> Self {
        self.options.facility = facility;
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.options.tag = tag.into();
        self
    }

    /// JSON unless set otherwise.
    #[must_use]
    pub const fn format(mut self, format: Format) -> Self {
        self.options.format = format;
        self
    }

    #[must_use]
    pub const fn level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Sub-builder consumes self, so there must be a way back to chain more outputs.
    #[must_use]
    pub fn done(mut self) -> LoggerBuilder {
        self.parent.sinks.push(PendingSink::Syslog {
            options: self.options,
            level: self.level,
        });
        self.parent
    }
}
