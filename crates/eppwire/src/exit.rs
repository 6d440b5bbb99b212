use std::fmt;
use std::io;

use eppwire_client::ClientError;
use eppwire_frame::FrameError;
use eppwire_transport::TransportError;
use eppwire_xml::XmlError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

fn io_code(err: &io::Error) -> i32 {
    match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound => USAGE,
        _ => TRANSPORT_ERROR,
    }
}

fn transport_code(err: &TransportError) -> i32 {
    match err {
        TransportError::Resolve { .. } => TRANSPORT_ERROR,
        TransportError::Connect { source, .. } | TransportError::Io(source) => {
            io_code(source)
        }
        TransportError::TlsConfig(_) | TransportError::TlsFile { .. } => USAGE,
        TransportError::TlsHandshake { source, .. } => match source.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
            _ => TRANSPORT_ERROR,
        },
    }
}

fn frame_code(err: &FrameError) -> i32 {
    match err {
        FrameError::Io(source) => io_code(source),
        FrameError::PayloadTooLarge { .. } => DATA_INVALID,
        FrameError::ConnectionClosed { .. } | FrameError::TruncatedHeader { .. } => FAILURE,
        FrameError::InvalidLength { .. } => DATA_INVALID,
    }
}

pub fn client_error(context: &str, err: ClientError) -> CliError {
    let code = match &err {
        ClientError::Configuration(_) => USAGE,
        ClientError::Connection { source, .. } => transport_code(source),
        ClientError::Protocol(source) => frame_code(source),
        ClientError::Transport(source) => frame_code(source),
        ClientError::Timeout(_) => TIMEOUT,
        ClientError::NotConnected => FAILURE,
        ClientError::Syntax { .. } => DATA_INVALID,
        ClientError::Input { source, .. } => io_code(source),
        ClientError::Xml(XmlError::Scratch { source, .. }) => io_code(source),
        ClientError::Xml(_) => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}
