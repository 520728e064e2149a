//! Tests for cleanup module.

use chrono::{TimeDelta, TimeZone, Utc};
use statlog::cleanup::{backup_path, collect_backups, enforce};
use statlog::{RetentionPolicy, format_duration, format_size, parse_duration};
use std::fs;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tempfile::tempdir;

fn write_backup(log_path: &Path, days_ago: i64, content: &str) -> std::path::PathBuf {
    let rotated = Utc::now() - TimeDelta::days(days_ago);
    let path = backup_path(log_path, rotated);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn parse_duration_units() {
    assert_eq!(parse_duration("30s"), Some(Duration::from_secs(30)));
    assert_eq!(parse_duration("5m"), Some(Duration::from_secs(300)));
    assert_eq!(parse_duration("2h"), Some(Duration::from_secs(7200)));
    assert_eq!(parse_duration("250ms"), Some(Duration::from_millis(250)));
    assert_eq!(parse_duration("1.5s"), Some(Duration::from_millis(1500)));
    assert_eq!(parse_duration("42"), Some(Duration::from_secs(42)));
    assert_eq!(parse_duration("-1s"), None);
    assert_eq!(parse_duration("soon"), None);
}

#[test]
fn format_duration_round_trips_common_values() {
    assert_eq!(format_duration(Duration::from_secs(30)), "30s");
    assert_eq!(format_duration(Duration::from_secs(300)), "5m");
    assert_eq!(format_duration(Duration::from_secs(7200)), "2h");
    assert_eq!(format_duration(Duration::from_millis(1500)), "1500ms");
}

#[test]
fn format_size_bytes() {
    assert_eq!(format_size(100), "100 B");
    assert_eq!(format_size(1024), "1.00 KB");
    assert_eq!(format_size(1024 * 1024), "1.00 MB");
    assert_eq!(format_size(1024 * 1024 * 1024), "1.00 GB");
}

#[test]
fn backup_path_embeds_rotation_time() {
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 45).unwrap();
    let path = backup_path(Path::new("/var/log/app.log"), at);
    assert_eq!(path, Path::new("/var/log/app-2024-03-01T12-30-45.000.log"));
}

#[test]
fn collect_ignores_unrelated_files() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("app.log");
    fs::write(&log, "live").unwrap();
    fs::write(dir.path().join("app-notes.log"), "x").unwrap();
    fs::write(dir.path().join("other-2024-03-01T12-30-45.000.log"), "x").unwrap();
    write_backup(&log, 1, "old");

    let backups = collect_backups(&log).unwrap();
    assert_eq!(backups.len(), 1);
    assert!(!backups[0].compressed);
}

#[test]
fn collect_sorts_newest_first() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("app.log");
    write_backup(&log, 3, "c");
    write_backup(&log, 1, "a");
    write_backup(&log, 2, "b");

    let backups = collect_backups(&log).unwrap();
    let contents: Vec<String> = backups
        .iter()
        .map(|b| fs::read_to_string(&b.path).unwrap())
        .collect();
    assert_eq!(contents, ["a", "b", "c"]);
}

#[test]
fn collect_in_missing_directory_is_empty() {
    let dir = tempdir().unwrap();
    let backups = collect_backups(&dir.path().join("nope/app.log")).unwrap();
    assert!(backups.is_empty());
}

#[test]
fn enforce_empty_is_noop() {
    let dir = tempdir().unwrap();
    let result = enforce(
        &dir.path().join("app.log"),
        &RetentionPolicy::default(),
        Utc::now(),
    )
    .unwrap();
    assert!(result.is_empty());
}

#[test]
fn enforce_keeps_newest_max_backups() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("app.log");
    let newest = write_backup(&log, 1, "1");
    let middle = write_backup(&log, 2, "2");
    let oldest = write_backup(&log, 3, "3");

    let policy = RetentionPolicy {
        max_backups: 2,
        max_age_days: 0,
        compress: false,
    };
    let result = enforce(&log, &policy, Utc::now()).unwrap();

    assert_eq!(result.deleted, vec![oldest.clone()]);
    assert_eq!(result.freed, 1);
    assert!(newest.exists());
    assert!(middle.exists());
    assert!(!oldest.exists());
}

#[test]
fn enforce_deletes_backups_past_max_age() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("app.log");
    let fresh = write_backup(&log, 1, "fresh");
    let stale = write_backup(&log, 40, "stale");

    let policy = RetentionPolicy {
        max_backups: 0,
        max_age_days: 30,
        compress: false,
    };
    let result = enforce(&log, &policy, Utc::now()).unwrap();

    assert_eq!(result.deleted.len(), 1);
    assert!(fresh.exists());
    assert!(!stale.exists());
}

#[test]
fn enforce_compresses_survivors() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("app.log");
    let content = "line of log output\n".repeat(200);
    let backup = write_backup(&log, 1, &content);

    let policy = RetentionPolicy {
        max_backups: 0,
        max_age_days: 0,
        compress: true,
    };
    let result = enforce(&log, &policy, Utc::now()).unwrap();

    assert_eq!(result.compressed.len(), 1);
    assert!(result.compressed_saved > 0);
    assert!(!backup.exists());

    let gz = &result.compressed[0];
    assert!(gz.to_string_lossy().ends_with(".log.gz"));
    let mut decoded = String::new();
    flate2::read::GzDecoder::new(fs::File::open(gz).unwrap())
        .read_to_string(&mut decoded)
        .unwrap();
    assert_eq!(decoded, content);

    // Compressed backups are still recognized, and not compressed twice
    let backups = collect_backups(&log).unwrap();
    assert_eq!(backups.len(), 1);
    assert!(backups[0].compressed);
    let again = enforce(&log, &policy, Utc::now()).unwrap();
    assert!(again.is_empty());
}

#[test]
fn summary_mentions_counts() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("app.log");
    write_backup(&log, 1, "a");
    write_backup(&log, 2, "b");

    let policy = RetentionPolicy {
        max_backups: 1,
        max_age_days: 0,
        compress: false,
    };
    let result = enforce(&log, &policy, Utc::now()).unwrap();
    assert!(result.summary().starts_with("1 deleted"));
}

#[test]
fn collect_recognizes_numbered_backups() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("app.log");
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 45).unwrap();
    let first = backup_path(&log, at);
    fs::write(&first, "first").unwrap();
    fs::write(dir.path().join("app-2024-03-01T12-30-45.000-1.log"), "second").unwrap();
    fs::write(dir.path().join("app-2024-03-01T12-30-45.000-2.log.gz"), "third").unwrap();
    fs::write(dir.path().join("app-2024-03-01T12-30-45.000-x.log"), "stray").unwrap();

    let backups = collect_backups(&log).unwrap();
    let indexes: Vec<u32> = backups.iter().map(|b| b.index).collect();
    assert_eq!(indexes, [2, 1, 0]);
    assert!(backups.iter().all(|b| b.rotated_at == at));
    assert!(backups[0].compressed);
    assert_eq!(backups[2].path, first);
}

#[test]
fn compression_never_replaces_an_existing_archive() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("app.log");
    let backup = write_backup(&log, 1, "newer content");
    let gz = format!("{}.gz", backup.display());
    fs::write(&gz, "older archive").unwrap();

    let policy = RetentionPolicy {
        max_backups: 0,
        max_age_days: 0,
        compress: true,
    };
    let result = enforce(&log, &policy, Utc::now()).unwrap();

    assert_eq!(result.failed.len(), 1);
    assert_eq!(fs::read_to_string(&gz).unwrap(), "older archive");
    assert_eq!(fs::read_to_string(&backup).unwrap(), "newer content");
}
