//! Console sink. Writes each record as one line to stdout, stderr, or a caller-supplied writer.

use super::Output;
use crate::fmt::{Format, Formatter};
use crate::level::Level;
use crate::record::{Attr, LogRecord};

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// Where console lines go. `Writer` lets tests and embedders capture or break the stream.
#[derive(Clone, Default)]
pub enum ConsoleTarget {
    #[default]
    Stdout,
    Stderr,
    Writer(Arc<Mutex<Box<dyn Write + Send>>>),
}

impl ConsoleTarget {
    #[must_use]
    pub fn writer(writer: impl Write + Send + 'static) -> Self {
        Self::Writer(Arc::new(Mutex::new(Box::new(writer))))
    }

    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        match self {
            Self::Stdout => io::stdout().lock().write_all(line),
            Self::Stderr => io::stderr().lock().write_all(line),
            Self::Writer(writer) => writer
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .write_all(line),
        }
    }

    fn flush(&self) -> io::Result<()> {
        match self {
            Self::Stdout => io::stdout().flush(),
            Self::Stderr => io::stderr().flush(),
            Self::Writer(writer) => writer
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .flush(),
        }
    }
}

impl fmt::Debug for ConsoleTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("Stdout"),
            Self::Stderr => f.write_str("Stderr"),
            Self::Writer(_) => f.write_str("Writer(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConsoleOutput {
    formatter: Formatter,
    min_level: Level,
    target: ConsoleTarget,
}

impl Default for ConsoleOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleOutput {
    /// Plain text to stdout at `Info` and above.
    #[must_use]
    pub fn new() -> Self {
        Self {
            formatter: Formatter::new(Format::Text),
            min_level: Level::Info,
            target: ConsoleTarget::Stdout,
        }
    }

    #[must_use]
    pub fn format(mut self, format: Format) -> Self {
        self.formatter = Formatter::new(format);
        self
    }

    #[must_use]
    pub const fn level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    #[must_use]
    pub fn target(mut self, target: ConsoleTarget) -> Self {
        self.target = target;
        self
    }

    fn derive(&self, formatter: Formatter) -> Arc<dyn Output> {
        Arc::new(Self {
            formatter,
            min_level: self.min_level,
            target: self.target.clone(),
        })
    }
}

impl Output for ConsoleOutput {
    fn enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    fn handle(&self, record: &LogRecord) -> Result<(), crate::Error> {
        let mut line = Vec::with_capacity(256);
        self.formatter.encode(record, &mut line)?;
        self.target.write_line(&line)?;
        Ok(())
    }

    fn with_attrs(&self, attrs: &[Attr]) -> Arc<dyn Output> {
        self.derive(self.formatter.with_attrs(attrs))
    }

    fn with_group(&self, name: &str) -> Arc<dyn Output> {
        self.derive(self.formatter.with_group(name))
    }

    fn flush(&self) -> Result<(), crate::Error> {
        self.target.flush()?;
        Ok(())
    }
}
