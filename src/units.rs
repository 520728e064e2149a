//! Config files spell durations as `"30s"` / `"5m"` and diagnostics want sizes as `"1.50 MB"`;
//! these helpers bridge raw values and the human-readable forms.

use std::time::Duration;

/// Accepts `ms`, `s`, `m`, `h` suffixes; a bare number is seconds. Fractions are allowed (`1.5s`).
#[must_use]
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim().to_lowercase();
    // Millis divide rather than multiply by 0.001, so whole milliseconds stay exact
    let (num_str, multiplier, divisor): (&str, f64, f64) = if let Some(n) = s.strip_suffix("ms") {
        (n, 1.0, 1000.0)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1.0, 1.0)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60.0, 1.0)
    } else if let Some(n) = s.strip_suffix('h') {
        (n, 3600.0, 1.0)
    } else {
        (s.as_str(), 1.0, 1.0)
    };

    let n = num_str.trim().parse::<f64>().ok()?;
    if !n.is_finite() || n < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(n * multiplier / divisor).ok()
}

/// Inverse of `parse_duration` for config round-trips and diagnostics.
#[must_use]
pub fn format_duration(d: Duration) -> String {
    let millis = d.as_millis();
    if millis % 1000 != 0 {
        format!("{millis}ms")
    } else if millis % 3_600_000 == 0 && millis > 0 {
        format!("{}h", millis / 3_600_000)
    } else if millis % 60_000 == 0 && millis > 0 {
        format!("{}m", millis / 60_000)
    } else {
        format!("{}s", millis / 1000)
    }
}

/// Raw byte counts are unreadable in diagnostics.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let bytes_f = bytes as f64;

    if bytes >= 1024 * 1024 * 1024 {
        format!("{:.2} GB", bytes_f / (1024.0 * 1024.0 * 1024.0))
    } else if bytes >= 1024 * 1024 {
        format!("{:.2} MB", bytes_f / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.2} KB", bytes_f / 1024.0)
    } else {
        format!("{bytes} B")
    }
}
