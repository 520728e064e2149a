//! Free-space query for the filesystem holding the log file.

use std::path::Path;

/// Bytes available to unprivileged writers on the filesystem containing `file`.
///
/// Queries the file's directory, so it works before the file exists.
///
/// # Errors
/// `DiskStat` when `statvfs` fails (missing directory, permission denied).
pub fn available_bytes(file: &Path) -> Result<u64, crate::Error> {
    let dir = match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let stat = nix::sys::statvfs::statvfs(dir).map_err(crate::Error::DiskStat)?;
    // Field widths differ across platforms
    #[allow(clippy::unnecessary_cast, clippy::useless_conversion)]
    let avail = u64::from(stat.blocks_available()).saturating_mul(u64::from(stat.fragment_size()));
    Ok(avail)
}
