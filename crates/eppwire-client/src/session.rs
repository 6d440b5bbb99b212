use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use eppwire_frame::{FrameConfig, FrameError, FrameReader, FrameWriter};
use eppwire_transport::{connect, ConnectTarget, EppStream};
use tracing::{debug, info, trace, warn};

use crate::config::{ConnectOptions, ConnectionParams};
use crate::error::{ClientError, Result};

/// Lifecycle of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No connection has been attempted.
    Unconnected,
    /// A connect is in progress.
    Connecting,
    /// A live stream is held and the greeting has been read.
    Connected,
    /// The stream was released by [`Session::close`].
    Closed,
    /// A connect attempt or an I/O operation failed; the stream is gone.
    Failed,
}

/// Owns the live stream and performs whole-frame I/O on it.
///
/// Any failure while reading or writing leaves the frame boundary unknown,
/// so the stream is released and the session moves to
/// [`SessionState::Failed`]. Nothing is retried.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    stream: Option<EppStream>,
    peer: Option<SocketAddr>,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
    frame_config: FrameConfig,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Unconnected,
            stream: None,
            peer: None,
            read_timeout: None,
            write_timeout: None,
            frame_config: FrameConfig::default(),
        }
    }

    /// Connect, optionally upgrade to TLS, and read the greeting.
    ///
    /// An existing connection is closed first.
    pub fn open(&mut self, params: &ConnectionParams, options: &ConnectOptions) -> Result<Bytes> {
        if self.stream.is_some() {
            debug!("closing existing connection before reconnecting");
            self.close();
        }
        options.validate()?;

        self.state = SessionState::Connecting;
        self.read_timeout = options.read_timeout;
        self.write_timeout = options.write_timeout;
        self.frame_config = options.frame.clone();

        let mut target = ConnectTarget::new(params.host(), params.port())
            .with_connect_timeout(options.connect_timeout);
        if params.tls() {
            target = target.with_tls(options.tls.clone());
        }

        let stream = connect(&target)
            .and_then(|stream| {
                stream.set_read_timeout(options.read_timeout)?;
                stream.set_write_timeout(options.write_timeout)?;
                Ok(stream)
            })
            .map_err(|source| {
                self.state = SessionState::Failed;
                ClientError::Connection {
                    host: params.host().to_string(),
                    port: params.port(),
                    source,
                }
            })?;

        self.peer = stream.peer_addr().ok();
        self.stream = Some(stream);
        self.state = SessionState::Connected;

        let greeting = self.receive()?;
        info!(
            host = params.host(),
            port = params.port(),
            tls = params.tls(),
            greeting_bytes = greeting.len(),
            "session established"
        );
        Ok(greeting)
    }

    /// Encode `payload` and write the whole frame.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        let config = self.frame_config.clone();
        let stream = self.live_stream()?;
        let result = FrameWriter::with_config(stream, config).send(payload);

        match result {
            Ok(()) => {
                debug!(bytes = payload.len(), "frame sent");
                trace!(payload = %String::from_utf8_lossy(payload), "outbound frame");
                Ok(())
            }
            // Rejected before any byte was written; the stream is still in sync.
            Err(err @ FrameError::PayloadTooLarge { .. }) => Err(ClientError::Protocol(err)),
            Err(err) => {
                let err = self.classify(err, self.write_timeout);
                self.fail(&err);
                Err(err)
            }
        }
    }

    /// Block until one complete frame arrives and return its payload.
    pub fn receive(&mut self) -> Result<Bytes> {
        let config = self.frame_config.clone();
        let stream = self.live_stream()?;
        let result = FrameReader::with_config(stream, config).read_frame();

        match result {
            Ok(frame) => {
                debug!(bytes = frame.payload.len(), "frame received");
                trace!(payload = %String::from_utf8_lossy(&frame.payload), "inbound frame");
                Ok(frame.into_payload())
            }
            Err(err) => {
                let err = self.classify(err, self.read_timeout);
                self.fail(&err);
                Err(err)
            }
        }
    }

    /// Release the stream. Safe to call in any state, any number of times.
    pub fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown();
            debug!(peer = ?self.peer, "connection closed");
        }
        self.state = SessionState::Closed;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }

    /// Address of the server of the current or most recent connection.
    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    fn live_stream(&mut self) -> Result<&mut EppStream> {
        match (self.state, self.stream.as_mut()) {
            (SessionState::Connected, Some(stream)) => Ok(stream),
            _ => Err(ClientError::NotConnected),
        }
    }

    fn classify(&self, err: FrameError, timeout: Option<Duration>) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(timeout.unwrap_or_default())
        } else if err.is_protocol() {
            ClientError::Protocol(err)
        } else {
            ClientError::Transport(err)
        }
    }

    fn fail(&mut self, err: &ClientError) {
        warn!(peer = ?self.peer, error = %err, "session failed");
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown();
        }
        self.state = SessionState::Failed;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown();
        }
    }
}
