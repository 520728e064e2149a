//! Record rendering. Every sink delegates to a `Formatter` that writes one line into a
//! caller-provided buffer, so the syslog forwarder can reuse a single allocation.

mod color;
mod json;
mod text;

pub use color::{Color, colorize};

use crate::record::{Attr, LogRecord, Scope};
use chrono::{DateTime, SecondsFormat, Utc};
use std::str::FromStr;

/// Wire layout for a rendered record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// `time=... level=INFO msg="..." key=value`
    #[default]
    Text,
    /// One JSON object per line.
    Json,
    /// `LEVEL: message [key=value, ...]` with an ANSI-colored level. Console only.
    Color,
}

impl Format {
    /// Picks the layout the config's `json_object` / `colors` flags ask for.
    #[must_use]
    pub const fn select(json: bool, colors: bool) -> Self {
        if json {
            Self::Json
        } else if colors {
            Self::Color
        } else {
            Self::Text
        }
    }
}

impl FromStr for Format {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "color" | "colour" => Ok(Self::Color),
            other => Err(crate::Error::Config(format!("unknown format: {other}"))),
        }
    }
}

/// A `Format` plus the attributes and groups a derived handler has accumulated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Formatter {
    format: Format,
    scope: Scope,
}

impl Formatter {
    #[must_use]
    pub fn new(format: Format) -> Self {
        Self {
            format,
            scope: Scope::new(),
        }
    }

    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    #[must_use]
    pub fn with_attrs(&self, attrs: &[Attr]) -> Self {
        Self {
            format: self.format,
            scope: self.scope.with_attrs(attrs),
        }
    }

    #[must_use]
    pub fn with_group(&self, name: &str) -> Self {
        Self {
            format: self.format,
            scope: self.scope.with_group(name),
        }
    }

    /// Appends one newline-terminated line to `buf`.
    ///
    /// # Errors
    /// Serialization failures from the JSON encoder.
    pub fn encode(&self, record: &LogRecord, buf: &mut Vec<u8>) -> Result<(), crate::Error> {
        let attrs = self.scope.resolve(&record.attrs);
        match self.format {
            Format::Text => text::encode(record, &attrs, buf),
            Format::Json => json::encode(record, &attrs, buf)?,
            Format::Color => text::encode_colored(record, &attrs, buf),
        }
        buf.push(b'\n');
        Ok(())
    }

    /// Convenience for sinks that want an owned line.
    ///
    /// # Errors
    /// Serialization failures from the JSON encoder.
    pub fn render(&self, record: &LogRecord) -> Result<String, crate::Error> {
        let mut buf = Vec::with_capacity(256);
        self.encode(record, &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// RFC 3339 with as many fractional digits as needed; the health query parses this back.
#[must_use]
pub fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
