//! Syslog forwarder.
//!
//! Records are rendered by a delegate formatter into a buffer shared by every handler derived
//! from the same forwarder, then framed and relayed to the daemon at the severity the record's
//! level maps to. One mutex covers both the buffer and the connection, so messages from
//! concurrent callers never interleave on the wire.

mod transport;

pub use transport::Network;

use transport::{Header, Transport};

use super::Output;
use crate::fmt::{Format, Formatter};
use crate::internal;
use crate::level::Level;
use crate::record::{Attr, LogRecord};
use chrono::Utc;

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

/// Buffers that grew past this are released after the message is sent.
const MAX_RETAINED_BUFFER: usize = 64 * 1024;

/// Syslog facility codes (RFC 5424 section 6.2.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Facility {
    Kern,
    #[default]
    User,
    Mail,
    Daemon,
    Auth,
    Syslog,
    Lpr,
    News,
    Uucp,
    Cron,
    AuthPriv,
    Ftp,
    Local0,
    Local1,
    Local2,
    Local3,
    Local4,
    Local5,
    Local6,
    Local7,
}

impl Facility {
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Kern => 0,
            Self::User => 1,
            Self::Mail => 2,
            Self::Daemon => 3,
            Self::Auth => 4,
            Self::Syslog => 5,
            Self::Lpr => 6,
            Self::News => 7,
            Self::Uucp => 8,
            Self::Cron => 9,
            Self::AuthPriv => 10,
            Self::Ftp => 11,
            Self::Local0 => 16,
            Self::Local1 => 17,
            Self::Local2 => 18,
            Self::Local3 => 19,
            Self::Local4 => 20,
            Self::Local5 => 21,
            Self::Local6 => 22,
            Self::Local7 => 23,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kern => "kern",
            Self::User => "user",
            Self::Mail => "mail",
            Self::Daemon => "daemon",
            Self::Auth => "auth",
            Self::Syslog => "syslog",
            Self::Lpr => "lpr",
            Self::News => "news",
            Self::Uucp => "uucp",
            Self::Cron => "cron",
            Self::AuthPriv => "authpriv",
            Self::Ftp => "ftp",
            Self::Local0 => "local0",
            Self::Local1 => "local1",
            Self::Local2 => "local2",
            Self::Local3 => "local3",
            Self::Local4 => "local4",
            Self::Local5 => "local5",
            Self::Local6 => "local6",
            Self::Local7 => "local7",
        }
    }
}

impl FromStr for Facility {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let facility = match s.trim().to_lowercase().as_str() {
            "kern" => Self::Kern,
            "" | "user" => Self::User,
            "mail" => Self::Mail,
            "daemon" => Self::Daemon,
            "auth" => Self::Auth,
            "syslog" => Self::Syslog,
            "lpr" => Self::Lpr,
            "news" => Self::News,
            "uucp" => Self::Uucp,
            "cron" => Self::Cron,
            "authpriv" => Self::AuthPriv,
            "ftp" => Self::Ftp,
            "local0" => Self::Local0,
            "local1" => Self::Local1,
            "local2" => Self::Local2,
            "local3" => Self::Local3,
            "local4" => Self::Local4,
            "local5" => Self::Local5,
            "local6" => Self::Local6,
            "local7" => Self::Local7,
            other => {
                return Err(crate::Error::Config(format!(
                    "unknown syslog facility: {other}"
                )));
            }
        };
        Ok(facility)
    }
}

impl fmt::Display for Facility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyslogOptions {
    pub network: Network,
    /// `host:port` for network transports; a socket path (or empty to probe) for `Unix`.
    pub address: String,
    pub facility: Facility,
    /// Empty means the executable's file stem.
    pub tag: String,
    pub format: Format,
    pub level: Level,
}

impl Default for SyslogOptions {
    fn default() -> Self {
        Self {
            network: Network::Unix,
            address: String::new(),
            facility: Facility::User,
            tag: String::new(),
            format: Format::Json,
            level: Level::Info,
        }
    }
}

struct Shared {
    buf: Vec<u8>,
    frame: Vec<u8>,
    transport: Transport,
}

#[derive(Clone)]
pub struct SyslogOutput {
    shared: Arc<Mutex<Shared>>,
    header: Arc<Header>,
    formatter: Formatter,
    min_level: Level,
}

impl SyslogOutput {
    /// Dials the daemon once; the connection lives as long as any derived handler.
    ///
    /// # Errors
    /// `SyslogConnect` if the daemon cannot be reached.
    pub fn connect(options: &SyslogOptions) -> Result<Self, crate::Error> {
        let transport = Transport::connect(options.network, &options.address).map_err(|source| {
            crate::Error::SyslogConnect {
                network: options.network.to_string(),
                address: options.address.clone(),
                source,
            }
        })?;

        let tag = if options.tag.is_empty() {
            default_tag()
        } else {
            options.tag.clone()
        };
        let hostname = nix::unistd::gethostname()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "localhost".to_string());

        internal::debug(
            "SYSLOG",
            &format!(
                "Connected ({} {}) as {tag}",
                options.network,
                if options.address.is_empty() {
                    "local"
                } else {
                    &options.address
                }
            ),
        );

        // Color codes have no business in a syslog message
        let format = match options.format {
            Format::Color => Format::Text,
            other => other,
        };

        Ok(Self {
            shared: Arc::new(Mutex::new(Shared {
                buf: Vec::with_capacity(1024),
                frame: Vec::with_capacity(1024),
                transport,
            })),
            header: Arc::new(Header {
                facility: options.facility,
                tag,
                hostname,
                pid: std::process::id(),
            }),
            formatter: Formatter::new(format),
            min_level: options.level,
        })
    }

    fn derive(&self, formatter: Formatter) -> Arc<dyn Output> {
        Arc::new(Self {
            shared: Arc::clone(&self.shared),
            header: Arc::clone(&self.header),
            formatter,
            min_level: self.min_level,
        })
    }
}

impl Output for SyslogOutput {
    fn enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    fn handle(&self, record: &LogRecord) -> Result<(), crate::Error> {
        let mut guard = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        let shared = &mut *guard;
        shared.buf.clear();
        shared.frame.clear();

        let result = self
            .formatter
            .encode(record, &mut shared.buf)
            .and_then(|()| {
                let msg = trim_trailing_newlines(&shared.buf);
                self.header.frame(
                    &shared.transport,
                    record.level.severity(),
                    Utc::now(),
                    msg,
                    &mut shared.frame,
                );
                shared
                    .transport
                    .send(&shared.frame)
                    .map_err(crate::Error::Syslog)
            });

        shared.buf.clear();
        shared.frame.clear();
        if shared.buf.capacity() > MAX_RETAINED_BUFFER {
            shared.buf.shrink_to(MAX_RETAINED_BUFFER);
        }
        if shared.frame.capacity() > MAX_RETAINED_BUFFER {
            shared.frame.shrink_to(MAX_RETAINED_BUFFER);
        }
        result
    }

    fn with_attrs(&self, attrs: &[Attr]) -> Arc<dyn Output> {
        self.derive(self.formatter.with_attrs(attrs))
    }

    fn with_group(&self, name: &str) -> Arc<dyn Output> {
        self.derive(self.formatter.with_group(name))
    }
}

impl fmt::Debug for SyslogOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyslogOutput")
            .field("header", &self.header)
            .field("formatter", &self.formatter)
            .field("min_level", &self.min_level)
            .finish_non_exhaustive()
    }
}

fn trim_trailing_newlines(buf: &[u8]) -> &[u8] {
    let end = buf
        .iter()
        .rposition(|&b| b != b'\n' && b != b'\r')
        .map_or(0, |i| i + 1);
    &buf[..end]
}

fn default_tag() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
}
