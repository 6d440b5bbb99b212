use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use eppwire_frame::FrameError;
use eppwire_transport::TransportError;
use eppwire_xml::{SyntaxError, XmlError};

/// Which way a frame was travelling when it failed a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Client to server.
    Outbound,
    /// Server to client.
    Inbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Outbound => f.write_str("outbound"),
            Direction::Inbound => f.write_str("inbound"),
        }
    }
}

/// Errors that can occur in client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Missing or invalid construction parameters.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Socket or TLS failure while establishing the connection.
    #[error("cannot connect to {host}:{port}: {source}")]
    Connection {
        host: String,
        port: u16,
        #[source]
        source: TransportError,
    },

    /// The byte stream violated the framing rules.
    #[error("protocol error: {0}")]
    Protocol(#[source] FrameError),

    /// Reading or writing the stream failed.
    #[error("transport error: {0}")]
    Transport(#[source] FrameError),

    /// A configured read or write timeout elapsed.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The session has no live connection.
    #[error("not connected")]
    NotConnected,

    /// A frame is not well-formed XML. The message includes the document.
    #[error("{direction} frame is not well-formed XML: {source}\n{}", .source.document())]
    Syntax {
        direction: Direction,
        #[source]
        source: SyntaxError,
    },

    /// A file given as frame input could not be read.
    #[error("cannot read frame input {}: {source}", .path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Scratch file or serialization failure in the XML layer.
    #[error("xml error: {0}")]
    Xml(#[source] XmlError),
}

impl ClientError {
    pub(crate) fn syntax(direction: Direction, source: SyntaxError) -> Self {
        ClientError::Syntax { direction, source }
    }

    /// Wrap an XML-layer error, labelling syntax errors with `direction`.
    pub(crate) fn xml(direction: Direction, err: XmlError) -> Self {
        match err {
            XmlError::Syntax(source) => ClientError::syntax(direction, source),
            other => ClientError::Xml(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
