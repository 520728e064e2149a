#![no_main]
use libfuzzer_sys::fuzz_target;
use statlog::parse_duration;

fuzz_target!(|data: &str| {
    // Must not panic on any duration string
    let _ = parse_duration(data);
});
