//! XML handling for framed payloads.
//!
//! Provides a syntactic well-formedness check for client-authored text,
//! a small owned document model with a builder and serializer, and scoped
//! scratch files for payloads that must pass through the filesystem.

pub mod document;
pub mod error;
pub mod scratch;
pub mod validator;

pub use document::{Document, Element, Node};
pub use error::{Result, SyntaxError, XmlError};
pub use scratch::{ScratchFile, ScratchSpace};
pub use validator::validate;
