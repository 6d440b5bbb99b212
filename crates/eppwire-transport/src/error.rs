use std::path::PathBuf;

/// Errors that can occur while establishing or using a transport stream.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The host name could not be resolved to any socket address.
    ///
    /// The endpoint is kept in the fields; callers add it to their own
    /// message, so the display text leaves it out.
    #[error("address lookup failed: {source}")]
    Resolve {
        host: String,
        port: u16,
        source: std::io::Error,
    },

    /// Every resolved address refused or failed the TCP connection.
    #[error("TCP connection failed: {source}")]
    Connect {
        host: String,
        port: u16,
        source: std::io::Error,
    },

    /// The TLS client configuration could not be built.
    #[error("invalid TLS configuration: {0}")]
    TlsConfig(String),

    /// A TLS certificate or key file could not be loaded.
    #[error("failed to load {path}: {message}")]
    TlsFile { path: PathBuf, message: String },

    /// The TLS handshake with the server failed.
    #[error("TLS handshake failed: {source}")]
    TlsHandshake {
        host: String,
        source: std::io::Error,
    },

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
