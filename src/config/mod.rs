//! TOML configuration loading, typed override application, and environment overrides.
//!
//! Separated from struct definitions so that the loading logic (file I/O, override layering,
//! validation) stays independent of the serde schema.

mod structs;

pub use structs::{
    ConfigOverrides, ConsoleConfig, ConsoleOverrides, FileConfig, FileOverrides,
    HealthCheckConfig, HealthCheckOverrides, InternalConfig, SequenceConfig, SequenceOverrides,
    SyslogConfig, SyslogOverrides,
};

use crate::cleanup::RetentionPolicy;
use crate::fmt::Format;
use crate::internal;
use crate::level::Level;
use crate::output::{Facility, Network, RotateOptions, SyslogOptions};
use crate::units::parse_duration;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix for environment overrides: `STATLOG__FILE_OUTPUT__ENABLED=true`.
pub const ENV_PREFIX: &str = "STATLOG__";

/// An empty config file still produces a working logger that writes text to the console.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minimum level for every built-in sink.
    pub log_level: String,
    pub console_output: ConsoleConfig,
    pub file_output: FileConfig,
    pub syslog_output: SyslogConfig,
    pub health_check: HealthCheckConfig,
    pub sequence_info: SequenceConfig,
    /// statlog's own diagnostics, separate from the application's records.
    pub internal: InternalConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            console_output: ConsoleConfig::default(),
            file_output: FileConfig::default(),
            syslog_output: SyslogConfig::default(),
            health_check: HealthCheckConfig::default(),
            sequence_info: SequenceConfig::default(),
            internal: InternalConfig::default(),
        }
    }
}

impl Config {
    /// Loads the user's config from the default location.
    ///
    /// # Errors
    /// Fails if the config directory can't be determined or TOML parsing hits a syntax error.
    pub fn load() -> Result<Self, crate::Error> {
        internal::debug("CONFIG", "Loading config from default location");
        let config_path = Self::get_config_path()?;
        let config = Self::load_from(&config_path)?;
        internal::info(
            "CONFIG",
            &format!("Config loaded from {}", config_path.display()),
        );
        Ok(config)
    }

    /// Loads configuration from an explicit path. A missing file yields the defaults.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, crate::Error> {
        if !path.exists() {
            internal::debug("CONFIG", "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.file_output.file_path = shellexpand::tilde(&config.file_output.file_path).into_owned();
        Ok(config)
    }

    /// XDG-compliant path: `~/.config/statlog/statlog.toml`.
    ///
    /// # Errors
    /// Fails when the platform has no concept of a config directory (unlikely on Linux).
    pub fn get_config_path() -> Result<PathBuf, crate::Error> {
        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("statlog").join("statlog.toml"))
            .ok_or_else(|| crate::Error::Config("could not determine config directory".to_string()))
    }

    /// Replaces every value the overrides specify; `None` fields leave the loaded value alone.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref level) = overrides.log_level {
            self.log_level.clone_from(level);
        }

        if let Some(ref console) = overrides.console_output {
            let target = &mut self.console_output;
            set(&mut target.enabled, console.enabled);
            set(&mut target.json_object, console.json_object);
            set(&mut target.colors, console.colors);
        }

        if let Some(ref file) = overrides.file_output {
            let target = &mut self.file_output;
            set(&mut target.enabled, file.enabled);
            set_cloned(&mut target.file_path, file.file_path.as_ref());
            set(&mut target.max_file_size, file.max_file_size);
            set(&mut target.max_backups, file.max_backups);
            set(&mut target.max_age_days, file.max_age_days);
            set(&mut target.compress, file.compress);
        }

        if let Some(ref syslog) = overrides.syslog_output {
            let target = &mut self.syslog_output;
            set(&mut target.enabled, syslog.enabled);
            set_cloned(&mut target.network, syslog.network.as_ref());
            set_cloned(&mut target.addr, syslog.addr.as_ref());
            set(&mut target.json_object, syslog.json_object);
            set_cloned(&mut target.facility, syslog.facility.as_ref());
            set_cloned(&mut target.tag, syslog.tag.as_ref());
        }

        if let Some(ref health) = overrides.health_check {
            let target = &mut self.health_check;
            set(&mut target.enabled, health.enabled);
            set_cloned(&mut target.log_periodicity, health.log_periodicity.as_ref());
            set_cloned(
                &mut target.elasticsearch_periodicity,
                health.elasticsearch_periodicity.as_ref(),
            );
            set_cloned(
                &mut target.elasticsearch_index,
                health.elasticsearch_index.as_ref(),
            );
            set_cloned(&mut target.elasticsearch_url, health.elasticsearch_url.as_ref());
        }

        if let Some(ref sequence) = overrides.sequence_info {
            set(&mut self.sequence_info.enabled, sequence.enabled);
        }
    }

    /// Applies `STATLOG__*` variables from the process environment.
    ///
    /// # Errors
    /// Unknown keys or values that don't parse as the field's type.
    pub fn apply_env(&mut self) -> Result<(), crate::Error> {
        self.apply_env_from(std::env::vars())
    }

    /// Applies `STATLOG__SECTION__KEY=value` (or `STATLOG__LOG_LEVEL=value`) pairs; other
    /// variables are ignored.
    ///
    /// # Errors
    /// Unknown keys or values that don't parse as the field's type.
    pub fn apply_env_from<I, K, V>(&mut self, vars: I) -> Result<(), crate::Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(path) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let path = path.to_lowercase();
            internal::debug("CONFIG", &format!("Env override: {path}"));
            self.set_path(&path, value.as_ref())?;
        }
        Ok(())
    }

    fn set_path(&mut self, path: &str, value: &str) -> Result<(), crate::Error> {
        let (section, key) = path.split_once("__").unwrap_or(("", path));
        let unknown = || crate::Error::Config(format!("unknown config key: {path}"));

        match (section, key) {
            ("", "log_level") => self.log_level = value.to_string(),

            ("console_output", "enabled") => self.console_output.enabled = parse_bool(path, value)?,
            ("console_output", "json_object") => {
                self.console_output.json_object = parse_bool(path, value)?;
            }
            ("console_output", "colors") => self.console_output.colors = parse_bool(path, value)?,

            ("file_output", "enabled") => self.file_output.enabled = parse_bool(path, value)?,
            ("file_output", "file_path") => {
                self.file_output.file_path = shellexpand::tilde(value).into_owned();
            }
            ("file_output", "max_file_size") => {
                self.file_output.max_file_size = parse_number(path, value)?;
            }
            ("file_output", "max_backups") => {
                self.file_output.max_backups = parse_number(path, value)?;
            }
            ("file_output", "max_age_days") => {
                self.file_output.max_age_days = parse_number(path, value)?;
            }
            ("file_output", "compress") => self.file_output.compress = parse_bool(path, value)?,

            ("syslog_output", "enabled") => self.syslog_output.enabled = parse_bool(path, value)?,
            ("syslog_output", "network") => self.syslog_output.network = value.to_string(),
            ("syslog_output", "addr") => self.syslog_output.addr = value.to_string(),
            ("syslog_output", "json_object") => {
                self.syslog_output.json_object = parse_bool(path, value)?;
            }
            ("syslog_output", "facility") => self.syslog_output.facility = value.to_string(),
            ("syslog_output", "tag") => self.syslog_output.tag = value.to_string(),

            ("health_check", "enabled") => self.health_check.enabled = parse_bool(path, value)?,
            ("health_check", "log_periodicity") => {
                parse_interval(path, value)?;
                self.health_check.log_periodicity = value.to_string();
            }
            ("health_check", "elasticsearch_periodicity") => {
                parse_interval(path, value)?;
                self.health_check.elasticsearch_periodicity = value.to_string();
            }
            ("health_check", "elasticsearch_index") => {
                self.health_check.elasticsearch_index = value.to_string();
            }
            ("health_check", "elasticsearch_url") => {
                self.health_check.elasticsearch_url = value.to_string();
            }

            ("sequence_info", "enabled") => self.sequence_info.enabled = parse_bool(path, value)?,

            ("internal", "enabled") => self.internal.enabled = parse_bool(path, value)?,
            ("internal", "level") => self.internal.level = value.to_string(),

            _ => return Err(unknown()),
        }
        Ok(())
    }

    /// Rejects configs that would build a logger that cannot work.
    ///
    /// # Errors
    /// `InvalidLevel` for an unknown level, `Config` for every other inconsistency.
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.level()?;
        self.internal.level.parse::<Level>()?;

        if self.file_output.enabled && self.file_output.file_path.trim().is_empty() {
            return Err(crate::Error::Config(
                "file output enabled but file_path is empty".to_string(),
            ));
        }

        if self.syslog_output.enabled {
            let options = self.syslog_output.options(Level::Info)?;
            if options.network != Network::Unix && options.address.is_empty() {
                return Err(crate::Error::Config(format!(
                    "syslog network {} requires addr",
                    options.network
                )));
            }
        }

        if self.health_check.enabled {
            self.health_check.log_interval()?;
            self.health_check.query_interval()?;
            if self.health_check.elasticsearch_url.trim().is_empty() {
                return Err(crate::Error::Config(
                    "health check enabled but elasticsearch_url is empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Config stores level as a string for TOML ergonomics; this converts to the typed enum.
    ///
    /// # Errors
    /// `InvalidLevel` when the string names no level.
    pub fn level(&self) -> Result<Level, crate::Error> {
        Ok(self.log_level.parse::<Level>()?)
    }
}

impl ConsoleConfig {
    #[must_use]
    pub const fn format(&self) -> Format {
        Format::select(self.json_object, self.colors)
    }
}

impl FileConfig {
    #[must_use]
    pub fn path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.file_path).into_owned())
    }

    #[must_use]
    pub const fn rotate_options(&self) -> RotateOptions {
        RotateOptions {
            max_size_mb: self.max_file_size,
            retention: RetentionPolicy {
                max_backups: self.max_backups,
                max_age_days: self.max_age_days,
                compress: self.compress,
            },
        }
    }
}

impl SyslogConfig {
    /// Typed forwarder options at the given minimum level.
    ///
    /// # Errors
    /// Unknown network or facility names.
    pub fn options(&self, level: Level) -> Result<SyslogOptions, crate::Error> {
        Ok(SyslogOptions {
            network: self.network.parse()?,
            address: self.addr.clone(),
            facility: self.facility.parse::<Facility>()?,
            tag: self.tag.clone(),
            format: if self.json_object {
                Format::Json
            } else {
                Format::Text
            },
            level,
        })
    }
}

impl HealthCheckConfig {
    /// # Errors
    /// Unparsable or zero `log_periodicity`.
    pub fn log_interval(&self) -> Result<Duration, crate::Error> {
        parse_interval("health_check.log_periodicity", &self.log_periodicity)
    }

    /// # Errors
    /// Unparsable or zero `elasticsearch_periodicity`.
    pub fn query_interval(&self) -> Result<Duration, crate::Error> {
        parse_interval(
            "health_check.elasticsearch_periodicity",
            &self.elasticsearch_periodicity,
        )
    }
}

fn set<T: Copy>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

fn set_cloned(target: &mut String, value: Option<&String>) {
    if let Some(value) = value {
        target.clone_from(value);
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, crate::Error> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(crate::Error::Config(format!(
            "{key}: expected a boolean, got '{other}'"
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, crate::Error> {
    value
        .trim()
        .parse()
        .map_err(|_| crate::Error::Config(format!("{key}: expected a number, got '{value}'")))
}

fn parse_interval(key: &str, value: &str) -> Result<Duration, crate::Error> {
    match parse_duration(value) {
        Some(d) if !d.is_zero() => Ok(d),
        _ => Err(crate::Error::Config(format!(
            "{key}: invalid duration '{value}'"
        ))),
    }
}
