//! Fan-out of one record to every registered sink.
//!
//! A failing sink never stops the others: every enabled sink is invoked in registration order
//! and each failure is reported with the sink it came from.

use crate::error::Error;
use crate::level::Level;
use crate::output::{Output, SinkHandle, SinkKind};
use crate::record::{Attr, LogRecord};

use std::sync::Arc;

/// One failed write, or the failed disk-space query when `sink` is `None`.
#[derive(Debug, Clone)]
pub struct DispatchError {
    pub error: Arc<Error>,
    pub record: LogRecord,
    pub sink: Option<SinkHandle>,
}

impl DispatchError {
    #[must_use]
    pub fn new(error: Error, record: &LogRecord, sink: Option<SinkHandle>) -> Self {
        Self {
            error: Arc::new(error),
            record: record.clone(),
            sink,
        }
    }

    /// The failing sink's kind, or `None` for unattributed failures.
    #[must_use]
    pub fn kind(&self) -> Option<&SinkKind> {
        self.sink.as_ref().map(SinkHandle::kind)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    sinks: Vec<SinkHandle>,
}

impl Dispatcher {
    #[must_use]
    pub const fn new(sinks: Vec<SinkHandle>) -> Self {
        Self { sinks }
    }

    #[must_use]
    pub fn sinks(&self) -> &[SinkHandle] {
        &self.sinks
    }

    #[must_use]
    pub fn sink_kinds(&self) -> Vec<SinkKind> {
        self.sinks.iter().map(|s| s.kind().clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Writes `record` to every enabled sink and returns one entry per failing sink, in
    /// sink order.
    #[must_use]
    pub fn dispatch(&self, record: &LogRecord) -> Vec<DispatchError> {
        self.sinks
            .iter()
            .filter(|sink| sink.output().enabled(record.level))
            .filter_map(|sink| {
                sink.output()
                    .handle(record)
                    .err()
                    .map(|e| DispatchError::new(e, record, Some(sink.clone())))
            })
            .collect()
    }

    fn derive(&self, f: impl Fn(&SinkHandle) -> SinkHandle) -> Self {
        Self {
            sinks: self.sinks.iter().map(f).collect(),
        }
    }
}

impl Output for Dispatcher {
    fn enabled(&self, level: Level) -> bool {
        self.sinks.iter().any(|sink| sink.output().enabled(level))
    }

    /// Fails with `Error::Joined` over every per-sink failure, even a single one.
    fn handle(&self, record: &LogRecord) -> Result<(), Error> {
        joined(&self.dispatch(record))
    }

    fn with_attrs(&self, attrs: &[Attr]) -> Arc<dyn Output> {
        Arc::new(self.derive_attrs(attrs))
    }

    fn with_group(&self, name: &str) -> Arc<dyn Output> {
        Arc::new(self.derive_group(name))
    }

    fn flush(&self) -> Result<(), Error> {
        let errors = self
            .sinks
            .iter()
            .filter_map(|sink| sink.output().flush().err().map(Arc::new))
            .collect();
        Error::join(errors).map_or(Ok(()), Err)
    }
}

impl Dispatcher {
    /// Typed form of `Output::with_attrs`, for callers that keep the dispatcher concrete.
    #[must_use]
    pub fn derive_attrs(&self, attrs: &[Attr]) -> Self {
        if attrs.is_empty() {
            return self.clone();
        }
        self.derive(|sink| sink.with_attrs(attrs))
    }

    /// Typed form of `Output::with_group`.
    #[must_use]
    pub fn derive_group(&self, name: &str) -> Self {
        if name.is_empty() {
            return self.clone();
        }
        self.derive(|sink| sink.with_group(name))
    }
}

/// Aggregate of the sink-attributed entries; unattributed ones are left out.
pub(crate) fn joined(errors: &[DispatchError]) -> Result<(), Error> {
    let attributed: Vec<_> = errors
        .iter()
        .filter(|d| d.sink.is_some())
        .map(|d| Arc::clone(&d.error))
        .collect();
    if attributed.is_empty() {
        Ok(())
    } else {
        Err(Error::Joined(attributed))
    }
}
