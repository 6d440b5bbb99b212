use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::codec::{body_len, decode_header, Frame, FrameConfig, HEADER_SIZE};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete frames from any `Read` stream.
///
/// Reads exactly the bytes a frame declares and nothing beyond it, so the
/// stream stays positioned on the next frame boundary. Partial reads are
/// handled internally: callers always get complete frames.
pub struct FrameReader<T> {
    inner: T,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Read the next complete frame (blocking).
    pub fn read_frame(&mut self) -> Result<Frame> {
        let total = self.read_header()?;
        if total as usize > self.config.max_frame_size {
            return Err(FrameError::PayloadTooLarge {
                size: total as usize,
                max: self.config.max_frame_size,
            });
        }

        let payload = self.read_body(total)?;
        trace!(total, "frame received");
        Ok(Frame { payload })
    }

    /// Read the 4-byte header and return the declared total length.
    pub fn read_header(&mut self) -> Result<u32> {
        let mut header = [0u8; HEADER_SIZE];
        let received = self.fill(&mut header)?;
        decode_header(&header[..received])
    }

    /// Read exactly `total - 4` payload bytes for a header declaring `total`.
    pub fn read_body(&mut self, total: u32) -> Result<Bytes> {
        let expected = body_len(total)?;
        let mut body = BytesMut::with_capacity(expected.min(INITIAL_BUFFER_CAPACITY));
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        while body.len() < expected {
            let want = (expected - body.len()).min(READ_CHUNK_SIZE);
            let received = self.fill(&mut chunk[..want])?;
            body.extend_from_slice(&chunk[..received]);
            if received < want {
                return Err(FrameError::ConnectionClosed {
                    expected,
                    received: body.len(),
                });
            }
        }

        Ok(body.freeze())
    }

    /// Read until `buf` is full or the stream ends; returns the byte count.
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0usize;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(filled)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
