//! Length-prefixed framing for XML protocol messages.
//!
//! Every message on the wire is:
//! - a 4-byte big-endian unsigned total length N (header included)
//! - exactly N - 4 bytes of XML payload
//!
//! The declared length is authoritative; payload content is never inspected
//! to find a message boundary. No partial reads in user code.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    body_len, decode_frame, decode_header, encode, encode_frame, frame_length, Frame, FrameConfig,
    HEADER_SIZE, MAX_FRAME_SIZE,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
