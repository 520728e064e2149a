//! Logger construction from a statlog config file.

use super::{Logger, LoggerBuilder};
use crate::config::Config;
use crate::health::HealthMonitor;
use crate::internal;

impl Logger {
    /// Loads the default config file, applies `STATLOG__*` environment overrides and builds.
    ///
    /// # Errors
    /// Config parse or validation failures, or an unreachable syslog daemon.
    pub fn from_default_config() -> Result<Self, crate::Error> {
        let mut config = Config::load()?;
        config.apply_env()?;
        Self::from_config(&config)
    }

    /// Builds console, file and syslog sinks as the config enables them. With none enabled the
    /// logger falls back to plain text on stdout.
    ///
    /// # Errors
    /// Validation failures (unknown level, file output without a path, ...) or an unreachable
    /// syslog daemon.
    pub fn from_config(config: &Config) -> Result<Self, crate::Error> {
        config.validate()?;
        internal::init_with_config(&config.internal);
        internal::debug("LOGGER", "Building logger from config");

        let level = config.level()?;
        internal::debug("LOGGER", &format!("Log level: {level}"));
        let mut builder = LoggerBuilder::new()
            .level(level)
            .sequence(config.sequence_info.enabled);

        if config.console_output.enabled {
            builder = builder
                .console()
                .format(config.console_output.format())
                .done();
        }

        if config.file_output.enabled {
            let path = config.file_output.path();
            internal::debug("FILE", &format!("Logging to {}", path.display()));
            builder = builder
                .file()
                .path(path)
                .rotate(config.file_output.rotate_options())
                .done();
        }

        if config.syslog_output.enabled {
            builder = builder
                .syslog()
                .options(config.syslog_output.options(level)?)
                .done();
        }

        let logger = builder.build()?;
        internal::debug("LOGGER", "Logger ready");
        Ok(logger)
    }

    /// Like `from_config`, also starting the health monitor when `[health_check]` enables it.
    /// The monitor stops when the returned handle is dropped.
    ///
    /// # Errors
    /// Same as `from_config`.
    pub fn from_config_with_monitor(
        config: &Config,
    ) -> Result<(Self, Option<HealthMonitor>), crate::Error> {
        let logger = Self::from_config(config)?;
        let monitor = if config.health_check.enabled {
            Some(logger.start_health_monitor(&config.health_check)?)
        } else {
            None
        };
        Ok((logger, monitor))
    }
}
