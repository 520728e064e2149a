#![no_main]
use libfuzzer_sys::fuzz_target;
use statlog::Config;

fuzz_target!(|data: &str| {
    // One `KEY=value` pair per line
    let vars: Vec<(String, String)> = data
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (format!("{}{k}", statlog::config::ENV_PREFIX), v.to_string()))
        .collect();

    let mut config = Config::default();
    let _ = config.apply_env_from(vars);
});
