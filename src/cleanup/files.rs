//! Backup discovery. Rotated files are named `<stem>-<timestamp><ext>` (plus `.gz` once
//! compressed) next to the live log; the timestamp in the name is the rotation time. A
//! second rotation within the same millisecond gets `<stem>-<timestamp>-<n><ext>`.

use crate::internal;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// Embedded in backup names. Dashes instead of colons keep names portable.
pub(crate) const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";

const COMPRESS_SUFFIX: &str = ".gz";

/// One rotated-out log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupFile {
    pub path: PathBuf,
    /// Rotation time parsed from the file name.
    pub rotated_at: DateTime<Utc>,
    /// Collision counter from the name; zero for the first backup of a millisecond.
    pub index: u32,
    pub compressed: bool,
    pub size: u64,
}

/// Splits `dir/app.log` into (`dir`, `app-`, `.log`).
pub(crate) fn name_parts(log_path: &Path) -> (PathBuf, String, String) {
    let dir = log_path
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let stem = log_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = log_path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (dir, format!("{stem}-"), ext)
}

/// Path the live file is renamed to when it rotates at `now`.
#[must_use]
pub fn backup_path(log_path: &Path, now: DateTime<Utc>) -> PathBuf {
    let (dir, prefix, ext) = name_parts(log_path);
    let stamp = now.format(BACKUP_TIME_FORMAT);
    dir.join(format!("{prefix}{stamp}{ext}"))
}

/// `backup_path`, or the first numbered variant that neither exists nor has a `.gz`.
pub(crate) fn free_backup_path(log_path: &Path, now: DateTime<Utc>) -> PathBuf {
    let taken = |path: &Path| path.exists() || compressed_path(path).exists();

    let first = backup_path(log_path, now);
    if !taken(&first) {
        return first;
    }

    let (dir, prefix, ext) = name_parts(log_path);
    let stamp = now.format(BACKUP_TIME_FORMAT);
    let mut index = 1u32;
    loop {
        let candidate = dir.join(format!("{prefix}{stamp}-{index}{ext}"));
        if !taken(&candidate) {
            return candidate;
        }
        index += 1;
    }
}

pub(crate) fn compressed_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(COMPRESS_SUFFIX);
    PathBuf::from(name)
}

/// `2024-01-02T03-04-05.678` or `2024-01-02T03-04-05.678-2`.
fn parse_stamp(stamp: &str) -> Option<(NaiveDateTime, u32)> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(stamp, BACKUP_TIME_FORMAT) {
        return Some((naive, 0));
    }
    let (stamp, index) = stamp.rsplit_once('-')?;
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let naive = NaiveDateTime::parse_from_str(stamp, BACKUP_TIME_FORMAT).ok()?;
    Some((naive, index.parse().ok()?))
}

/// Every backup belonging to `log_path`, newest first (higher collision counter first within a
/// millisecond).
///
/// # Errors
/// The log directory cannot be read.
pub fn collect_backups(log_path: &Path) -> Result<Vec<BackupFile>, crate::Error> {
    let (dir, prefix, ext) = name_parts(log_path);
    let mut backups = Vec::new();

    if !dir.is_dir() {
        return Ok(backups);
    }

    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(rest) = name.strip_prefix(&prefix) else {
            continue;
        };
        let (rest, compressed) = rest
            .strip_suffix(COMPRESS_SUFFIX)
            .map_or((rest, false), |r| (r, true));
        let Some(stamp) = rest.strip_suffix(ext.as_str()) else {
            continue;
        };
        // Files that merely share the prefix are not ours
        let Some((naive, index)) = parse_stamp(stamp) else {
            continue;
        };
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        if !meta.is_file() {
            continue;
        }

        internal::debug("CLEANUP", &format!("Found backup: {name}"));
        backups.push(BackupFile {
            path: entry.path(),
            rotated_at: naive.and_utc(),
            index,
            compressed,
            size: meta.len(),
        });
    }

    backups.sort_by(|a, b| (b.rotated_at, b.index).cmp(&(a.rotated_at, a.index)));
    Ok(backups)
}
