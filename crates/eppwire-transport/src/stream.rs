use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use rustls::{ClientConnection, StreamOwned};
use tracing::debug;

use crate::error::Result;

/// A connected registry stream; implements Read + Write.
///
/// This is the I/O type returned by [`crate::connect`]. It wraps either a
/// plain TCP socket or a TCP socket carrying a completed TLS session.
pub struct EppStream {
    inner: EppStreamInner,
}

enum EppStreamInner {
    Plain(TcpStream),
    Tls(Box<StreamOwned<ClientConnection, TcpStream>>),
}

impl Read for EppStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            EppStreamInner::Plain(stream) => stream.read(buf),
            EppStreamInner::Tls(stream) => stream.read(buf),
        }
    }
}

impl Write for EppStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            EppStreamInner::Plain(stream) => stream.write(buf),
            EppStreamInner::Tls(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            EppStreamInner::Plain(stream) => stream.flush(),
            EppStreamInner::Tls(stream) => stream.flush(),
        }
    }
}

impl EppStream {
    pub(crate) fn plain(stream: TcpStream) -> Self {
        Self {
            inner: EppStreamInner::Plain(stream),
        }
    }

    pub(crate) fn tls(stream: StreamOwned<ClientConnection, TcpStream>) -> Self {
        Self {
            inner: EppStreamInner::Tls(Box::new(stream)),
        }
    }

    fn socket(&self) -> &TcpStream {
        match &self.inner {
            EppStreamInner::Plain(stream) => stream,
            EppStreamInner::Tls(stream) => &stream.sock,
        }
    }

    /// Whether the stream carries a TLS session.
    pub fn is_tls(&self) -> bool {
        matches!(self.inner, EppStreamInner::Tls(_))
    }

    /// Address of the connected server.
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        self.socket().peer_addr().map_err(Into::into)
    }

    /// Set read timeout on the underlying socket.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.socket().set_read_timeout(timeout).map_err(Into::into)
    }

    /// Set write timeout on the underlying socket.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.socket()
            .set_write_timeout(timeout)
            .map_err(Into::into)
    }

    /// Close the stream.
    ///
    /// TLS streams first try to send a close_notify alert. Failures are
    /// logged and ignored: the peer may already have gone away.
    pub fn shutdown(&mut self) {
        if let EppStreamInner::Tls(stream) = &mut self.inner {
            stream.conn.send_close_notify();
            while stream.conn.wants_write() {
                match stream.conn.write_tls(&mut stream.sock) {
                    Ok(0) => break,
                    Ok(_) => {}
                    Err(err) => {
                        debug!(error = %err, "close_notify not delivered");
                        break;
                    }
                }
            }
        }

        match self.socket().shutdown(Shutdown::Both) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotConnected => {}
            Err(err) => debug!(error = %err, "socket shutdown failed"),
        }
    }
}

impl std::fmt::Debug for EppStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.inner {
            EppStreamInner::Plain(_) => "tcp",
            EppStreamInner::Tls(_) => "tls",
        };
        let mut dbg = f.debug_struct("EppStream");
        dbg.field("type", &kind);
        if let Ok(addr) = self.socket().peer_addr() {
            dbg.field("peer", &addr);
        }
        dbg.finish()
    }
}
