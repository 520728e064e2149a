//! Sink handlers. Each destination sits behind the `Output` trait so the dispatcher can fan a
//! record out without knowing what it writes to; `SinkKind` names the destination when a
//! write fails.

mod console;
mod file;
mod rotate;
pub mod syslog;

pub use console::{ConsoleOutput, ConsoleTarget};
pub use file::FileOutput;
pub use rotate::{RotateOptions, RotatingWriter};
pub use syslog::{Facility, Network, SyslogOptions, SyslogOutput};

use crate::level::Level;
use crate::record::{Attr, LogRecord};
use std::fmt;
use std::sync::Arc;

/// The handler contract shared by sinks, the dispatcher and the stats collector.
///
/// `Send + Sync` bounds enable concurrent logging from multiple threads; implementations
/// that touch shared buffers serialize internally.
pub trait Output: Send + Sync {
    /// Whether this sink would accept a record at `level`.
    fn enabled(&self, level: Level) -> bool;

    /// Writes one record.
    ///
    /// # Errors
    /// Any failure of the underlying destination (closed stdout, full disk, dropped connection).
    fn handle(&self, record: &LogRecord) -> Result<(), crate::Error>;

    /// A new handler whose output carries `attrs`; `self` is unaffected.
    fn with_attrs(&self, attrs: &[Attr]) -> Arc<dyn Output>;

    /// A new handler that nests subsequent attributes under `name`; `self` is unaffected.
    fn with_group(&self, name: &str) -> Arc<dyn Output>;

    /// Buffered sinks may lose tail data on abrupt exit without an explicit flush.
    ///
    /// # Errors
    /// I/O errors from the underlying destination.
    fn flush(&self) -> Result<(), crate::Error> {
        Ok(())
    }
}

/// Closed set of destinations used to attribute failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SinkKind {
    Console,
    File,
    Syslog,
    /// Caller-supplied sinks registered through `LoggerBuilder::output`.
    Custom(String),
}

impl SinkKind {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Console => "console_output",
            Self::File => "file_output",
            Self::Syslog => "syslog_output",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sink together with the tag it is reported under.
#[derive(Clone)]
pub struct SinkHandle {
    kind: SinkKind,
    output: Arc<dyn Output>,
}

impl SinkHandle {
    #[must_use]
    pub fn new(kind: SinkKind, output: Arc<dyn Output>) -> Self {
        Self { kind, output }
    }

    #[must_use]
    pub const fn kind(&self) -> &SinkKind {
        &self.kind
    }

    #[must_use]
    pub fn output(&self) -> &Arc<dyn Output> {
        &self.output
    }

    /// True when both handles wrap the very same sink instance.
    #[must_use]
    pub fn same_sink(&self, other: &Self) -> bool {
        self.kind == other.kind && Arc::ptr_eq(&self.output, &other.output)
    }

    #[must_use]
    pub fn with_attrs(&self, attrs: &[Attr]) -> Self {
        Self {
            kind: self.kind.clone(),
            output: self.output.with_attrs(attrs),
        }
    }

    #[must_use]
    pub fn with_group(&self, name: &str) -> Self {
        Self {
            kind: self.kind.clone(),
            output: self.output.with_group(name),
        }
    }
}

impl fmt::Debug for SinkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkHandle")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
