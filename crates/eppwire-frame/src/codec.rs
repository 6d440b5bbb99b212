use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: total length (4 bytes, big-endian).
pub const HEADER_SIZE: usize = 4;

/// Largest total frame length the header can express.
pub const MAX_FRAME_SIZE: usize = u32::MAX as usize;

/// One protocol message unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The XML payload, without the length header.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Consume the frame, returning its payload.
    pub fn into_payload(self) -> Bytes {
        self.payload
    }
}

/// Total length to declare in the header for a payload of `payload_len` bytes.
pub fn frame_length(payload_len: usize) -> Result<u32> {
    payload_len
        .checked_add(HEADER_SIZE)
        .and_then(|total| u32::try_from(total).ok())
        .ok_or(FrameError::PayloadTooLarge {
            size: payload_len,
            max: MAX_FRAME_SIZE - HEADER_SIZE,
        })
}

/// Encode a payload into the wire format.
///
/// Wire format:
/// ```text
/// ┌────────────────────┬──────────────────────────┐
/// │ Total length N (4B)│ XML payload              │
/// │ big-endian         │ (N - 4 bytes)            │
/// └────────────────────┴──────────────────────────┘
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let total = frame_length(payload.len())?;
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u32(total);
    dst.put_slice(payload);
    Ok(())
}

/// Encode a payload into a freshly allocated buffer.
pub fn encode(payload: &[u8]) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    encode_frame(payload, &mut buf)?;
    Ok(buf.freeze())
}

/// Interpret the first 4 bytes as the big-endian total frame length.
pub fn decode_header(header: &[u8]) -> Result<u32> {
    match header.get(..HEADER_SIZE) {
        Some(&[a, b, c, d]) => Ok(u32::from_be_bytes([a, b, c, d])),
        _ => Err(FrameError::TruncatedHeader {
            received: header.len(),
        }),
    }
}

/// Number of payload bytes that follow a header declaring `total`.
pub fn body_len(total: u32) -> Result<usize> {
    (total as usize)
        .checked_sub(HEADER_SIZE)
        .ok_or(FrameError::InvalidLength { length: total })
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes exactly one frame from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_frame_size: usize) -> Result<Option<Frame>> {
    if src.len() < HEADER_SIZE {
        return Ok(None); // Need more data
    }

    let total = decode_header(&src[..])?;
    let payload_len = body_len(total)?;

    if total as usize > max_frame_size {
        return Err(FrameError::PayloadTooLarge {
            size: total as usize,
            max: max_frame_size,
        });
    }

    if src.len() < total as usize {
        return Ok(None); // Need more data
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(payload_len).freeze();

    Ok(Some(Frame { payload }))
}

/// Configuration for the frame codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameConfig {
    /// Maximum total frame size in bytes accepted when decoding or encoding.
    /// Default: the full range of the 32-bit length header.
    pub max_frame_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_size: MAX_FRAME_SIZE,
        }
    }
}
