//! Tests for logger functionality.

use statlog::config::Config;
use statlog::fmt::Format;
use statlog::{Attr, Error, Level, LogContext, Logger, SinkKind};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn json_logger(buf: &SharedBuf, level: Level) -> Logger {
    Logger::builder()
        .level(level)
        .console()
        .format(Format::Json)
        .writer(buf.clone())
        .done()
        .build()
        .unwrap()
}

#[test]
fn builder_without_sinks_falls_back_to_console() {
    let logger = Logger::builder().build().unwrap();
    assert_eq!(logger.sink_kinds(), vec![SinkKind::Console]);
    assert!(logger.enabled(Level::Info));
    assert!(!logger.enabled(Level::Debug));
}

#[test]
fn builder_level_applies_to_sinks() {
    let logger = Logger::builder().level(Level::Debug).console().done().build().unwrap();
    assert!(logger.enabled(Level::Debug));
}

#[test]
fn builder_level_after_sinks_still_applies() {
    let buf = SharedBuf::default();
    let logger = Logger::builder()
        .console()
        .writer(buf.clone())
        .done()
        .level(Level::Error)
        .build()
        .unwrap();
    logger.warn("dropped", &[]);
    logger.error("kept", &[]);
    assert_eq!(buf.lines().len(), 1);
}

#[test]
fn builder_multiple_outputs() {
    let tmp_dir = TempDir::new().unwrap();
    let logger = Logger::builder()
        .console()
        .writer(SharedBuf::default())
        .done()
        .file()
        .path(tmp_dir.path().join("out.log"))
        .done()
        .build()
        .unwrap();
    assert_eq!(logger.sink_kinds(), vec![SinkKind::Console, SinkKind::File]);
}

#[test]
fn per_sink_level_overrides_builder_level() {
    let quiet = SharedBuf::default();
    let loud = SharedBuf::default();
    let logger = Logger::builder()
        .level(Level::Debug)
        .console()
        .writer(quiet.clone())
        .level(Level::Error)
        .done()
        .console()
        .writer(loud.clone())
        .done()
        .build()
        .unwrap();

    logger.info("info", &[]);
    assert!(quiet.lines().is_empty());
    assert_eq!(loud.lines().len(), 1);
}

#[test]
fn log_respects_level() {
    let buf = SharedBuf::default();
    let logger = json_logger(&buf, Level::Warn);

    logger.debug("d", &[]);
    logger.info("i", &[]);
    logger.warn("w", &[]);
    logger.error("e", &[]);

    let lines = buf.lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains(r#""level":"WARN""#));
    assert!(lines[1].contains(r#""level":"ERROR""#));
}

#[test]
fn attrs_are_rendered() {
    let buf = SharedBuf::default();
    let logger = json_logger(&buf, Level::Info);
    logger.info("user login", &[Attr::string("user", "ada"), Attr::int("attempt", 2)]);

    let lines = buf.lines();
    assert!(lines[0].ends_with(r#""msg":"user login","user":"ada","attempt":2}"#));
}

#[test]
fn log_ctx_puts_context_first() {
    let buf = SharedBuf::default();
    let logger = json_logger(&buf, Level::Info);
    let ctx = LogContext::new()
        .with("request_id", "r-9")
        .with("tenant", "acme");

    logger.log_ctx(&ctx, Level::Info, "handled", &[Attr::int("status", 200)]);

    let lines = buf.lines();
    assert!(
        lines[0].contains(r#""request_id":"r-9","tenant":"acme","status":200"#),
        "{}",
        lines[0]
    );
}

#[test]
fn log_ctx_with_empty_context() {
    let buf = SharedBuf::default();
    let logger = json_logger(&buf, Level::Info);
    logger.log_ctx(&LogContext::new(), Level::Info, "plain", &[]);
    assert!(buf.lines()[0].ends_with(r#""msg":"plain"}"#));
}

#[test]
fn context_insert_replaces_in_place() {
    let mut ctx: LogContext = [("a", "1"), ("b", "2")].into_iter().collect();
    ctx.insert("a", "3");
    assert_eq!(ctx.len(), 2);
    assert_eq!(ctx.get("a"), Some("3"));
    assert_eq!(ctx.iter().map(|(k, _)| k).collect::<Vec<_>>(), ["a", "b"]);
}

#[test]
fn with_attrs_does_not_affect_parent() {
    let buf = SharedBuf::default();
    let logger = json_logger(&buf, Level::Info);
    let child = logger.with_attrs(&[Attr::string("component", "db")]);

    child.info("from child", &[]);
    logger.info("from parent", &[]);

    let lines = buf.lines();
    assert!(lines[0].contains(r#""component":"db""#));
    assert!(!lines[1].contains("component"));
}

#[test]
fn with_group_nests_attrs() {
    let buf = SharedBuf::default();
    let logger = json_logger(&buf, Level::Info)
        .with_attrs(&[Attr::string("svc", "api")])
        .with_group("http");

    logger.info("request", &[Attr::string("method", "GET")]);
    assert!(buf.lines()[0].contains(r#""svc":"api","http":{"method":"GET"}"#));
}

#[test]
fn try_log_ok_when_sinks_succeed() {
    let buf = SharedBuf::default();
    let logger = json_logger(&buf, Level::Info);
    assert!(logger.try_log(Level::Info, "ok", &[]).is_ok());
    assert!(logger.try_log(Level::Debug, "filtered", &[]).is_ok());
    assert_eq!(buf.lines().len(), 1);
}

#[test]
fn log_stats_reports_duration_and_no_errors() {
    let buf = SharedBuf::default();
    let logger = json_logger(&buf, Level::Info);
    let stats = logger.log_stats(Level::Info, "measured", &[]).unwrap();
    assert!(!stats.has_errors());
    // No file sink, so no disk query
    assert_eq!(stats.disk_avail, 0);
}

#[test]
fn from_config_builds_enabled_sinks() {
    let tmp_dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.log_level = "debug".to_string();
    config.file_output.enabled = true;
    config.file_output.file_path = tmp_dir.path().join("app.log").to_string_lossy().into_owned();
    config.sequence_info.enabled = true;

    let logger = Logger::from_config(&config).unwrap();
    assert_eq!(logger.sink_kinds(), vec![SinkKind::Console, SinkKind::File]);
    assert!(logger.enabled(Level::Debug));
    assert!(logger.sequence().is_some());
    let stats_config = logger.stats_collector().config();
    assert!(stats_config.file_enabled);
    assert_eq!(stats_config.file_path, tmp_dir.path().join("app.log"));
}

#[test]
fn from_config_with_nothing_enabled_falls_back() {
    let mut config = Config::default();
    config.console_output.enabled = false;
    let logger = Logger::from_config(&config).unwrap();
    assert_eq!(logger.sink_kinds(), vec![SinkKind::Console]);
}

#[test]
fn from_config_rejects_invalid_config() {
    let config = Config {
        log_level: "loud".to_string(),
        ..Config::default()
    };
    assert!(matches!(
        Logger::from_config(&config),
        Err(Error::InvalidLevel(_))
    ));
}

#[test]
fn from_config_without_health_check_has_no_monitor() {
    let (logger, monitor) = Logger::from_config_with_monitor(&Config::default()).unwrap();
    assert!(monitor.is_none());
    assert_eq!(logger.sink_kinds(), vec![SinkKind::Console]);
}

#[test]
fn clones_share_sinks() {
    let buf = SharedBuf::default();
    let logger = json_logger(&buf, Level::Info);
    let clone = logger.clone();
    logger.info("a", &[]);
    clone.info("b", &[]);
    assert_eq!(buf.lines().len(), 2);
    assert!(logger.flush().is_ok());
}
