//! Outcome of one retention pass.

use crate::units::format_size;
use std::path::PathBuf;

#[derive(Debug, Default)]
pub struct CleanupResult {
    /// Backups deleted for exceeding the count or age limit.
    pub deleted: Vec<PathBuf>,
    pub freed: u64,
    /// Backups replaced by a `.gz` copy.
    pub compressed: Vec<PathBuf>,
    pub compressed_saved: u64,
    /// Backups that could not be processed, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

impl CleanupResult {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty() && self.compressed.is_empty() && self.failed.is_empty()
    }

    /// One-line summary for diagnostics.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} deleted ({}), {} compressed ({} saved), {} failed",
            self.deleted.len(),
            format_size(self.freed),
            self.compressed.len(),
            format_size(self.compressed_saved),
            self.failed.len()
        )
    }
}
