//! Retention for rotated log backups. Without it the log directory grows until the disk
//! fills; each rotation runs one pass that enforces the count, age, and compression policy.

mod compress;
mod files;
mod result;

pub use files::{BackupFile, backup_path, collect_backups};
pub(crate) use files::free_backup_path;
pub use result::CleanupResult;

use crate::internal;
use chrono::{DateTime, TimeDelta, Utc};
use compress::compress_file;
use std::fs;
use std::path::Path;

/// Zero disables the corresponding limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Keep at most this many backups, newest first.
    pub max_backups: usize,
    /// Delete backups rotated out more than this many days ago.
    pub max_age_days: u32,
    /// Gzip backups that survive the count and age limits.
    pub compress: bool,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_backups: 0,
            max_age_days: 0,
            compress: true,
        }
    }
}

/// Single pass over the backups of `log_path`: count limit, then age limit, then compression.
///
/// # Errors
/// The log directory cannot be listed. Per-file failures land in `CleanupResult::failed`.
pub fn enforce(
    log_path: &Path,
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
) -> Result<CleanupResult, crate::Error> {
    let mut result = CleanupResult::default();
    let backups = collect_backups(log_path)?;
    if backups.is_empty() {
        return Ok(result);
    }

    let cutoff = (policy.max_age_days > 0)
        .then(|| now - TimeDelta::days(i64::from(policy.max_age_days)));

    let mut survivors = Vec::with_capacity(backups.len());
    for (rank, backup) in backups.into_iter().enumerate() {
        let over_count = policy.max_backups > 0 && rank >= policy.max_backups;
        let too_old = cutoff.is_some_and(|cutoff| backup.rotated_at < cutoff);

        if over_count || too_old {
            internal::debug(
                "CLEANUP",
                &format!("Deleting backup: {}", backup.path.display()),
            );
            match fs::remove_file(&backup.path) {
                Ok(()) => {
                    result.freed += backup.size;
                    result.deleted.push(backup.path);
                }
                Err(e) => result.failed.push((backup.path, e.to_string())),
            }
        } else {
            survivors.push(backup);
        }
    }

    if policy.compress {
        for backup in survivors.into_iter().filter(|b| !b.compressed) {
            internal::debug(
                "CLEANUP",
                &format!("Compressing backup: {}", backup.path.display()),
            );
            match compress_file(&backup.path) {
                Ok((gz_path, saved)) => {
                    result.compressed_saved += saved;
                    result.compressed.push(gz_path);
                }
                Err(e) => result.failed.push((backup.path, e.to_string())),
            }
        }
    }

    if !result.is_empty() {
        internal::info("CLEANUP", &format!("Retention: {}", result.summary()));
    }

    Ok(result)
}
