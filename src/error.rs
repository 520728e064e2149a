//! Unified error type for all statlog operations.

use std::fmt;
use std::sync::Arc;

/// Error type for statlog operations.
#[derive(Debug)]
pub enum Error {
    /// I/O error from a sink's destination.
    Io(std::io::Error),
    /// TOML config parsing error.
    ConfigParse(toml::de::Error),
    /// Invalid or inconsistent configuration value.
    Config(String),
    /// Record serialization failed.
    Format(String),
    /// Unknown log level string.
    InvalidLevel(String),
    /// The syslog daemon could not be reached when the forwarder was built.
    SyslogConnect {
        network: String,
        address: String,
        source: std::io::Error,
    },
    /// A single message could not be delivered to the syslog daemon.
    Syslog(std::io::Error),
    /// Free-space query on the file sink's filesystem failed.
    DiskStat(nix::Error),
    /// A single write is larger than the rotating file's size limit.
    FileTooLarge { write: u64, max: u64 },
    /// Several sinks failed during the same call.
    Joined(Vec<Arc<Error>>),
}

impl Error {
    /// Folds per-sink failures into one value; a single failure is returned unwrapped.
    #[must_use]
    pub fn join(mut errors: Vec<Arc<Self>>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => {
                let only = errors.remove(0);
                Some(Arc::try_unwrap(only).unwrap_or_else(|shared| Self::Joined(vec![shared])))
            }
            _ => Some(Self::Joined(errors)),
        }
    }

    /// Number of underlying failures this error stands for.
    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            Self::Joined(errors) => errors.iter().map(|e| e.count()).sum(),
            _ => 1,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::ConfigParse(e) => write!(f, "parse error: {e}"),
            Self::Config(msg) => write!(f, "invalid config: {msg}"),
            Self::Format(msg) => write!(f, "format error: {msg}"),
            Self::InvalidLevel(level) => write!(f, "unknown log level: '{level}'"),
            Self::SyslogConnect {
                network,
                address,
                source,
            } => {
                let network = if network.is_empty() { "local" } else { network };
                write!(f, "failed to connect to syslog ({network} {address}): {source}")
            }
            Self::Syslog(e) => write!(f, "syslog write failed: {e}"),
            Self::DiskStat(e) => write!(f, "disk usage query failed: {e}"),
            Self::FileTooLarge { write, max } => {
                write!(f, "write length {write} exceeds maximum file size {max}")
            }
            // One failure per line
            Self::Joined(errors) => {
                for (i, e) in errors.iter().enumerate() {
                    if i > 0 {
                        f.write_str("\n")?;
                    }
                    write!(f, "{e}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) | Self::Syslog(e) => Some(e),
            Self::SyslogConnect { source, .. } => Some(source),
            Self::ConfigParse(e) => Some(e),
            Self::DiskStat(e) => Some(e),
            Self::Joined(errors) => errors
                .first()
                .map(|e| e.as_ref() as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Self::ConfigParse(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Format(format!("JSON serialization failed: {e}"))
    }
}
