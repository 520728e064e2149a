//! statlog's own diagnostic logger: rotation, retention, syslog and health-monitor lifecycle
//! messages, kept apart from the application's records.
//!
//! Uses `OnceLock` so the logger is initialized exactly once, even if several loggers are
//! built from config concurrently. Until then every call is a no-op.

use crate::config::InternalConfig;
use crate::fmt::Format;
use crate::level::Level;
use crate::logger::Logger;
use crate::output::ConsoleTarget;
use crate::record::Attr;
use std::sync::OnceLock;

static INTERNAL_LOGGER: OnceLock<Logger> = OnceLock::new();

/// Enables diagnostics at `level` on stderr. Only the first call takes effect.
pub fn init(level: Level) {
    if INTERNAL_LOGGER.get().is_some() {
        return;
    }
    let built = Logger::builder()
        .console()
        .target(ConsoleTarget::Stderr)
        .format(Format::Text)
        .level(level)
        .done()
        .build();
    if let Ok(logger) = built
        && INTERNAL_LOGGER.set(logger).is_ok()
    {
        debug("INTERNAL", &format!("Internal logger ready (level={level})"));
    }
}

/// Initializes from the `[internal]` section; a disabled section leaves diagnostics off.
pub fn init_with_config(config: &InternalConfig) {
    if !config.enabled {
        return;
    }
    init(config.level.parse().unwrap_or(Level::Warn));
}

#[must_use]
pub fn is_enabled() -> bool {
    INTERNAL_LOGGER.get().is_some()
}

fn log(level: Level, scope: &str, msg: &str) {
    if let Some(logger) = INTERNAL_LOGGER.get() {
        logger.log(level, msg, &[Attr::string("scope", scope)]);
    }
}

pub fn debug(scope: &str, msg: &str) {
    log(Level::Debug, scope, msg);
}

pub fn info(scope: &str, msg: &str) {
    log(Level::Info, scope, msg);
}

pub fn warn(scope: &str, msg: &str) {
    log(Level::Warn, scope, msg);
}

pub fn error(scope: &str, msg: &str) {
    log(Level::Error, scope, msg);
}
