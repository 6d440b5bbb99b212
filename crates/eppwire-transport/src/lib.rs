//! TCP and TLS stream transport.
//!
//! Provides a single stream type over the two ways a registry client talks
//! to its server:
//! - plain TCP
//! - TCP upgraded to TLS (rustls) before any frame is exchanged
//!
//! This is the lowest layer of eppwire. Framing and sessions build on the
//! [`EppStream`] returned by [`connect`].

pub mod error;
pub mod stream;
pub mod tcp;
pub mod tls;

pub use error::{Result, TransportError};
pub use stream::EppStream;
pub use tcp::{connect, ConnectTarget, DEFAULT_PORT};
pub use tls::TlsOptions;
