//! File sink: JSON lines through a rotating writer.

use super::Output;
use super::rotate::{RotateOptions, RotatingWriter};
use crate::fmt::{Format, Formatter};
use crate::level::Level;
use crate::record::{Attr, LogRecord};

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Derived handlers share one `RotatingWriter`, so rotation state stays consistent across them.
#[derive(Debug, Clone)]
pub struct FileOutput {
    writer: Arc<RotatingWriter>,
    formatter: Formatter,
    min_level: Level,
}

impl FileOutput {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, options: RotateOptions) -> Self {
        Self {
            writer: Arc::new(RotatingWriter::new(path, options)),
            formatter: Formatter::new(Format::Json),
            min_level: Level::Info,
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
    pub fn path(&self) -> &Path {
        self.writer.path()
    }

    #[must_use]
    pub fn writer(&self) -> &Arc<RotatingWriter> {
        &self.writer
    }

    fn derive(&self, formatter: Formatter) -> Arc<dyn Output> {
        Arc::new(Self {
            writer: Arc::clone(&self.writer),
            formatter,
            min_level: self.min_level,
        })
    }
}

impl Output for FileOutput {
    fn enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    fn handle(&self, record: &LogRecord) -> Result<(), crate::Error> {
        let mut line = Vec::with_capacity(256);
        self.formatter.encode(record, &mut line)?;
        self.writer.write_all(&line)
    }

    fn with_attrs(&self, attrs: &[Attr]) -> Arc<dyn Output> {
        self.derive(self.formatter.with_attrs(attrs))
    }

    fn with_group(&self, name: &str) -> Arc<dyn Output> {
        self.derive(self.formatter.with_group(name))
    }

    fn flush(&self) -> Result<(), crate::Error> {
        self.writer.sync()
    }
}
