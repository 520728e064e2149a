//! Configuration struct definitions.

use serde::Deserialize;

/// Console output configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Enable console output.
    pub enabled: bool,
    /// One JSON object per line; disables colors.
    pub json_object: bool,
    /// Color the level label. Ignored when `json_object` is set.
    pub colors: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            json_object: false,
            colors: true,
        }
    }
}

/// Rotating file output configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Enable file output.
    pub enabled: bool,
    /// Path to the live log file. `~` is expanded.
    pub file_path: String,
    /// Rotate once the file would exceed this many MiB.
    pub max_file_size: u64,
    /// Rotated backups to keep (0 keeps all).
    pub max_backups: usize,
    /// Delete backups older than this many days (0 keeps all).
    pub max_age_days: u32,
    /// Gzip rotated backups.
    pub compress: bool,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            file_path: String::new(),
            max_file_size: 100,
            max_backups: 5,
            max_age_days: 30,
            compress: true,
        }
    }
}

/// Syslog output configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyslogConfig {
    /// Enable syslog output.
    pub enabled: bool,
    /// `tcp`, `udp`, or empty for the local daemon.
    pub network: String,
    /// Remote daemon address, if any.
    pub addr: String,
    /// Send JSON objects instead of `key=value` text.
    pub json_object: bool,
    /// Facility name (`user`, `daemon`, `local0`..`local7`, ...).
    pub facility: String,
    /// Program tag; empty uses the executable name.
    pub tag: String,
}

impl Default for SyslogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            network: String::new(),
            addr: String::new(),
            json_object: true,
            facility: "user".to_string(),
            tag: String::new(),
        }
    }
}

/// Health-check monitor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Start the monitor together with the logger.
    pub enabled: bool,
    /// Interval between liveness records (`30s`, `5m`, ...).
    pub log_periodicity: String,
    /// Interval between backend queries.
    pub elasticsearch_periodicity: String,
    /// Index the liveness records are shipped to.
    pub elasticsearch_index: String,
    /// Base URL of the search backend.
    pub elasticsearch_url: String,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_periodicity: "30s".to_string(),
            elasticsearch_periodicity: "60s".to_string(),
            elasticsearch_index: "logs".to_string(),
            elasticsearch_url: "http://localhost:9200".to_string(),
        }
    }
}

/// Sequence numbering configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// Attach a `sequence_no` attribute to every record.
    pub enabled: bool,
}

/// The crate's own diagnostic output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InternalConfig {
    /// Print statlog's lifecycle diagnostics to stderr.
    pub enabled: bool,
    /// Minimum level for diagnostics.
    pub level: String,
}

impl Default for InternalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "warn".to_string(),
        }
    }
}

/// Programmatic overrides applied on top of a loaded config.
///
/// All fields are optional - only specified fields override the loaded values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub console_output: Option<ConsoleOverrides>,
    pub file_output: Option<FileOverrides>,
    pub syslog_output: Option<SyslogOverrides>,
    pub health_check: Option<HealthCheckOverrides>,
    pub sequence_info: Option<SequenceOverrides>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConsoleOverrides {
    pub enabled: Option<bool>,
    pub json_object: Option<bool>,
    pub colors: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileOverrides {
    pub enabled: Option<bool>,
    pub file_path: Option<String>,
    pub max_file_size: Option<u64>,
    pub max_backups: Option<usize>,
    pub max_age_days: Option<u32>,
    pub compress: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyslogOverrides {
    pub enabled: Option<bool>,
    pub network: Option<String>,
    pub addr: Option<String>,
    pub json_object: Option<bool>,
    pub facility: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HealthCheckOverrides {
    pub enabled: Option<bool>,
    pub log_periodicity: Option<String>,
    pub elasticsearch_periodicity: Option<String>,
    pub elasticsearch_index: Option<String>,
    pub elasticsearch_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SequenceOverrides {
    pub enabled: Option<bool>,
}
