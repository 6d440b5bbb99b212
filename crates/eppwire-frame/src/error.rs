use std::io::ErrorKind;

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Fewer than 4 header bytes arrived before the stream ended.
    #[error("truncated frame header ({received} of 4 bytes received)")]
    TruncatedHeader { received: usize },

    /// The declared total length cannot even cover the header.
    #[error("invalid frame length {length} (must be at least 4)")]
    InvalidLength { length: u32 },

    /// The frame exceeds the configured or representable maximum size.
    #[error("frame too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The connection was closed before the declared payload was received.
    #[error("connection closed after {received} of {expected} payload bytes")]
    ConnectionClosed { expected: usize, received: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// True for violations of the wire format, as opposed to I/O failures.
    pub fn is_protocol(&self) -> bool {
        !matches!(self, FrameError::Io(_))
    }

    /// True when a socket read or write timeout elapsed.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            FrameError::Io(err)
                if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
