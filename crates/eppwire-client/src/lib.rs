//! Blocking client for length-prefixed XML protocols such as EPP.
//!
//! This is the "just works" layer. Connect, receive the server greeting,
//! exchange whole frames, disconnect. Outbound text is checked for
//! well-formedness before it reaches the wire.

pub mod client;
pub mod config;
pub mod error;
pub mod input;
pub mod representation;
pub mod session;

#[cfg(test)]
mod testing;

pub use client::EppClient;
pub use config::{ConnectOptions, ConnectionParams};
pub use error::{ClientError, Direction, Result};
pub use input::{FrameInput, Payload};
pub use representation::{ParsedDocument, RawXml, Representation};
pub use session::{Session, SessionState};
