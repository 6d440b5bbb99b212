//! Client plumbing for length-prefixed XML protocols such as EPP.
//!
//! eppwire speaks the EPP TCP transport mapping: every message is a
//! 4-byte big-endian total length followed by an XML document, carried over
//! plain TCP or TLS. The server speaks first with a greeting.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP connect and TLS upgrade
//! - [`frame`]: length-prefixed framing
//! - [`xml`]: well-formedness checks, document model, scratch files
//! - [`client`]: session and client facade (behind the `client` feature)

/// Re-export transport types.
pub mod transport {
    pub use eppwire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use eppwire_frame::*;
}

/// Re-export XML types.
pub mod xml {
    pub use eppwire_xml::*;
}

/// Re-export client types (requires `client` feature).
#[cfg(feature = "client")]
pub mod client {
    pub use eppwire_client::*;
}
