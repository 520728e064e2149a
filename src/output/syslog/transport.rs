//! Connections to a syslog daemon and the RFC 3164 framing each one expects.

use super::Facility;
use crate::level::Severity;
use chrono::{DateTime, Local, Utc};

use std::fmt;
use std::io::{self, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};
use std::os::unix::net::{UnixDatagram, UnixStream};
use std::path::Path;
use std::str::FromStr;

/// Sockets a local daemon usually listens on, tried in order.
const LOCAL_SOCKETS: &[&str] = &["/dev/log", "/var/run/syslog", "/var/run/log"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Network {
    Tcp,
    Udp,
    /// The local daemon's Unix socket.
    #[default]
    Unix,
}

impl FromStr for Network {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tcp" | "tcp4" | "tcp6" => Ok(Self::Tcp),
            "udp" | "udp4" | "udp6" => Ok(Self::Udp),
            "" | "unix" | "unixgram" | "local" => Ok(Self::Unix),
            other => Err(crate::Error::Config(format!(
                "unknown syslog network: {other}"
            ))),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Unix => "unix",
        })
    }
}

pub(super) enum Transport {
    Tcp(TcpStream),
    Udp(UdpSocket),
    UnixDatagram(UnixDatagram),
    UnixStream(UnixStream),
}

impl Transport {
    pub(super) fn connect(network: Network, address: &str) -> io::Result<Self> {
        match network {
            Network::Tcp => TcpStream::connect(address).map(Self::Tcp),
            Network::Udp => {
                let target = resolve(address)?;
                let bind: SocketAddr = if target.is_ipv4() {
                    ([0, 0, 0, 0], 0).into()
                } else {
                    ([0u16; 8], 0).into()
                };
                let socket = UdpSocket::bind(bind)?;
                socket.connect(target)?;
                Ok(Self::Udp(socket))
            }
            Network::Unix if address.is_empty() => {
                let mut last_err = io::Error::new(
                    io::ErrorKind::NotFound,
                    "no local syslog socket found",
                );
                for path in LOCAL_SOCKETS {
                    match Self::connect_unix(Path::new(path)) {
                        Ok(transport) => return Ok(transport),
                        Err(e) => last_err = e,
                    }
                }
                Err(last_err)
            }
            Network::Unix => Self::connect_unix(Path::new(address)),
        }
    }

    /// Datagram first, stream as fallback; daemons differ.
    fn connect_unix(path: &Path) -> io::Result<Self> {
        let datagram = UnixDatagram::unbound().and_then(|socket| {
            socket.connect(path)?;
            Ok(socket)
        });
        match datagram {
            Ok(socket) => Ok(Self::UnixDatagram(socket)),
            Err(_) => UnixStream::connect(path).map(Self::UnixStream),
        }
    }

    const fn is_local(&self) -> bool {
        matches!(self, Self::UnixDatagram(_) | Self::UnixStream(_))
    }

    /// Stream transports need a delimiter between messages.
    const fn is_stream(&self) -> bool {
        matches!(self, Self::Tcp(_) | Self::UnixStream(_))
    }

    pub(super) fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.write_all(frame),
            Self::UnixStream(stream) => stream.write_all(frame),
            Self::Udp(socket) => socket.send(frame).map(|_| ()),
            Self::UnixDatagram(socket) => socket.send(frame).map(|_| ()),
        }
    }
}

fn resolve(address: &str) -> io::Result<SocketAddr> {
    address.to_socket_addrs()?.next().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("could not resolve {address}"),
        )
    })
}

/// Per-process header fields, fixed for the forwarder's lifetime.
#[derive(Debug, Clone)]
pub(super) struct Header {
    pub(super) facility: Facility,
    pub(super) tag: String,
    pub(super) hostname: String,
    pub(super) pid: u32,
}

impl Header {
    /// Writes one framed message into `frame`:
    /// `<PRI>TIMESTAMP HOSTNAME TAG[PID]: MSG` remotely, `<PRI>Mmm dd hh:mm:ss TAG[PID]: MSG` locally.
    pub(super) fn frame(
        &self,
        transport: &Transport,
        severity: Severity,
        now: DateTime<Utc>,
        msg: &[u8],
        frame: &mut Vec<u8>,
    ) {
        let pri = u16::from(self.facility.code()) * 8 + u16::from(severity.code());
        let header = if transport.is_local() {
            let stamp = now.with_timezone(&Local).format("%b %e %H:%M:%S");
            format!("<{pri}>{stamp} {}[{}]: ", self.tag, self.pid)
        } else {
            let stamp = crate::fmt::format_time(&now);
            format!("<{pri}>{stamp} {} {}[{}]: ", self.hostname, self.tag, self.pid)
        };

        frame.extend_from_slice(header.as_bytes());
        frame.extend_from_slice(msg);
        if transport.is_stream() {
            frame.push(b'\n');
        }
    }
}
