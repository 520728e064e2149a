#![no_main]
use libfuzzer_sys::fuzz_target;
use statlog::{Attr, Format, Formatter, Level, LogRecord};

fuzz_target!(|data: &str| {
    // Split fuzz input into message, key and group at the first two commas
    let mut parts = data.splitn(3, ',');
    let msg = parts.next().unwrap_or_default();
    let key = parts.next().unwrap_or_default();
    let group = parts.next().unwrap_or_default();

    let record = LogRecord::new(Level::Warn, msg).with_attrs([
        Attr::string(key, msg),
        Attr::group(group, vec![Attr::string(key, data)]),
    ]);

    for format in [Format::Text, Format::Json, Format::Color] {
        let formatter = Formatter::new(format)
            .with_group(group)
            .with_attrs(&[Attr::string(key, "v")]);
        let _ = formatter.render(&record);
    }
});
