use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::EppStream;
use crate::tls::{self, TlsOptions};

/// Registry port assigned to the protocol over TCP.
pub const DEFAULT_PORT: u16 = 700;

/// Where and how to connect.
#[derive(Debug, Clone)]
pub struct ConnectTarget {
    /// Host name or IP literal of the server.
    pub host: String,
    /// TCP port of the server.
    pub port: u16,
    /// TLS settings. `None` connects over plain TCP.
    pub tls: Option<TlsOptions>,
    /// Bound on the TCP connect and the TLS handshake. `None` blocks.
    pub connect_timeout: Option<Duration>,
}

impl ConnectTarget {
    /// Plain TCP target with no timeout.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            tls: None,
            connect_timeout: None,
        }
    }

    /// Upgrade the connection to TLS with the given options.
    pub fn with_tls(mut self, options: TlsOptions) -> Self {
        self.tls = Some(options);
        self
    }

    /// Bound the connect and handshake phase.
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Connect to a server (blocking), performing the TLS handshake if requested.
///
/// No frames are exchanged here; the returned stream is positioned before
/// the server greeting.
pub fn connect(target: &ConnectTarget) -> Result<EppStream> {
    let sock = connect_tcp(&target.host, target.port, target.connect_timeout)?;

    let stream = match &target.tls {
        None => EppStream::plain(sock),
        Some(options) => {
            sock.set_read_timeout(target.connect_timeout)?;
            sock.set_write_timeout(target.connect_timeout)?;
            let stream = tls::handshake(sock, &target.host, options)?;
            stream.set_read_timeout(None)?;
            stream.set_write_timeout(None)?;
            stream
        }
    };

    info!(
        host = %target.host,
        port = target.port,
        tls = stream.is_tls(),
        "connected to server"
    );
    Ok(stream)
}

fn connect_tcp(host: &str, port: u16, timeout: Option<Duration>) -> Result<TcpStream> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|source| TransportError::Resolve {
            host: host.to_string(),
            port,
            source,
        })?
        .collect();

    if addrs.is_empty() {
        return Err(TransportError::Resolve {
            host: host.to_string(),
            port,
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "host resolved to no addresses",
            ),
        });
    }

    let mut last_err = None;
    for addr in addrs {
        let attempt = match timeout {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        };
        match attempt {
            Ok(sock) => {
                sock.set_nodelay(true)?;
                debug!(%addr, "tcp connection established");
                return Ok(sock);
            }
            Err(err) => {
                debug!(%addr, error = %err, "tcp connect attempt failed");
                last_err = Some(err);
            }
        }
    }

    Err(TransportError::Connect {
        host: host.to_string(),
        port,
        source: last_err
            .unwrap_or_else(|| std::io::Error::other("no address accepted the connection")),
    })
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;

    use super::*;

    #[test]
    fn connects_over_plain_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = std::thread::spawn(move || {
            let (mut sock, _) = listener.accept().unwrap();
            sock.write_all(b"hi").unwrap();
        });

        let mut stream = connect(&ConnectTarget::new("127.0.0.1", port)).unwrap();
        assert!(!stream.is_tls());
        let mut buf = [0u8; 2];
        stream.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hi");

        server.join().unwrap();
    }

    #[test]
    fn refused_connection_reports_host_and_port() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = connect(&ConnectTarget::new("127.0.0.1", port)).unwrap_err();
        match err {
            TransportError::Connect { host, port: p, .. } => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(p, port);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn connect_timeout_is_accepted() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let target = ConnectTarget::new("127.0.0.1", port)
            .with_connect_timeout(Some(Duration::from_secs(2)));
        let stream = connect(&target).unwrap();
        let _accepted = listener.accept().unwrap();
        assert!(!stream.is_tls());
    }

    #[test]
    fn unresolvable_host_fails_to_resolve() {
        let err = connect(&ConnectTarget::new("host.invalid", DEFAULT_PORT)).unwrap_err();
        match err {
            TransportError::Resolve { host, port, .. } => {
                assert_eq!(host, "host.invalid");
                assert_eq!(port, DEFAULT_PORT);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
