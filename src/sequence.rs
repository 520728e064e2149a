//! Monotonic record numbering.

use crate::record::{Attr, LogRecord};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Attribute key the number is written under.
pub const SEQUENCE_KEY: &str = "sequence_no";

/// Hands out 1, 2, 3, ... across every clone, so concurrent callers each get a distinct number.
#[derive(Debug, Clone, Default)]
pub struct SequenceTagger {
    counter: Arc<AtomicU64>,
}

impl SequenceTagger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn next_number(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Numbers handed out so far.
    #[must_use]
    pub fn current(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }

    /// Appends `sequence_no` as the record's last attribute.
    pub fn tag(&self, record: &mut LogRecord) {
        record.attrs.push(Attr::uint(SEQUENCE_KEY, self.next_number()));
    }
}
