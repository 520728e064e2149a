#![no_main]
use libfuzzer_sys::fuzz_target;
use statlog::Config;

fuzz_target!(|data: &str| {
    // Parsing and validating arbitrary TOML must never panic
    if let Ok(config) = toml::from_str::<Config>(data) {
        let _ = config.validate();
        let _ = config.syslog_output.options(statlog::Level::Info);
        let _ = config.health_check.log_interval();
    }
});
