//! `key=value` rendering. Groups flatten into dotted keys (`request.id=7`).

use super::{Color, format_time};
use crate::record::{Attr, LogRecord, Value};
use std::fmt::Write;

pub(super) fn encode(record: &LogRecord, attrs: &[Attr], buf: &mut Vec<u8>) {
    let mut line = String::with_capacity(128);
    let _ = write!(
        line,
        "time={} level={} msg={}",
        format_time(&record.time),
        record.level.label(),
        quote(&record.message)
    );

    for (key, value) in flatten(attrs) {
        let _ = write!(line, " {}={}", quote(&key), render_value(value));
    }

    buf.extend_from_slice(line.as_bytes());
}

pub(super) fn encode_colored(record: &LogRecord, attrs: &[Attr], buf: &mut Vec<u8>) {
    let mut line = String::with_capacity(128);
    Color::for_level(record.level).paint(record.level.label(), &mut line);
    let _ = write!(line, ": {}", record.message);

    let pairs: Vec<String> = flatten(attrs)
        .into_iter()
        .map(|(key, value)| format!("{key}={}", render_value(value)))
        .collect();
    if !pairs.is_empty() {
        let _ = write!(line, " [{}]", pairs.join(", "));
    }

    buf.extend_from_slice(line.as_bytes());
}

/// Depth-first walk producing `(dotted.key, leaf)` pairs in insertion order.
fn flatten(attrs: &[Attr]) -> Vec<(String, &Value)> {
    fn walk<'a>(prefix: &str, attrs: &'a [Attr], out: &mut Vec<(String, &'a Value)>) {
        for attr in attrs {
            if attr.is_empty() {
                continue;
            }
            let key = if prefix.is_empty() {
                attr.key.clone()
            } else if attr.key.is_empty() {
                prefix.to_string()
            } else {
                format!("{prefix}.{}", attr.key)
            };
            match &attr.value {
                // An unnamed group inlines its members
                Value::Group(members) => walk(&key, members, out),
                leaf => out.push((key, leaf)),
            }
        }
    }

    let mut out = Vec::with_capacity(attrs.len());
    walk("", attrs, &mut out);
    out
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => quote(s),
        Value::Time(t) => format_time(t),
        other => quote(&other.to_string()),
    }
}

/// Quotes anything a `key=value` reader could misparse: spaces, `=`, quotes, control chars.
fn quote(s: &str) -> String {
    let needs_quoting = s.is_empty()
        || s.chars()
            .any(|c| c.is_whitespace() || c == '=' || c == '"' || c.is_control());
    if needs_quoting {
        format!("{s:?}")
    } else {
        s.to_string()
    }
}
