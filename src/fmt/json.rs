//! One JSON object per record. Written field-by-field rather than through a map so that
//! attribute order is preserved and repeated keys survive.

use super::format_time;
use crate::record::{Attr, LogRecord, Value};

pub(super) fn encode(
    record: &LogRecord,
    attrs: &[Attr],
    buf: &mut Vec<u8>,
) -> Result<(), serde_json::Error> {
    buf.push(b'{');
    write_key(buf, "time")?;
    serde_json::to_writer(&mut *buf, &format_time(&record.time))?;
    buf.push(b',');
    write_key(buf, "level")?;
    serde_json::to_writer(&mut *buf, record.level.label())?;
    buf.push(b',');
    write_key(buf, "msg")?;
    serde_json::to_writer(&mut *buf, &record.message)?;

    for attr in attrs.iter().filter(|a| !a.is_empty()) {
        buf.push(b',');
        write_attr(buf, attr)?;
    }

    buf.push(b'}');
    Ok(())
}

fn write_key(buf: &mut Vec<u8>, key: &str) -> Result<(), serde_json::Error> {
    serde_json::to_writer(&mut *buf, key)?;
    buf.push(b':');
    Ok(())
}

fn write_attr(buf: &mut Vec<u8>, attr: &Attr) -> Result<(), serde_json::Error> {
    // Unnamed groups are inlined into the enclosing object
    if attr.key.is_empty()
        && let Value::Group(members) = &attr.value
    {
        return write_members(buf, members);
    }

    write_key(buf, &attr.key)?;
    write_value(buf, &attr.value)
}

fn write_members(buf: &mut Vec<u8>, members: &[Attr]) -> Result<(), serde_json::Error> {
    for (i, member) in members.iter().filter(|a| !a.is_empty()).enumerate() {
        if i > 0 {
            buf.push(b',');
        }
        write_attr(buf, member)?;
    }
    Ok(())
}

fn write_value(buf: &mut Vec<u8>, value: &Value) -> Result<(), serde_json::Error> {
    match value {
        Value::String(s) => serde_json::to_writer(&mut *buf, s),
        Value::Int(n) => serde_json::to_writer(&mut *buf, n),
        Value::Uint(n) => serde_json::to_writer(&mut *buf, n),
        Value::Float(n) => serde_json::to_writer(&mut *buf, n),
        Value::Bool(b) => serde_json::to_writer(&mut *buf, b),
        Value::Time(t) => serde_json::to_writer(&mut *buf, &format_time(t)),
        // Nanoseconds, saturating at u64::MAX
        Value::Duration(d) => serde_json::to_writer(
            &mut *buf,
            &u64::try_from(d.as_nanos()).unwrap_or(u64::MAX),
        ),
        Value::Group(members) => {
            buf.push(b'{');
            write_members(buf, members)?;
            buf.push(b'}');
            Ok(())
        }
    }
}
