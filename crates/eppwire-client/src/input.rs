use std::path::{Path, PathBuf};

use eppwire_xml::{Document, Element};

use crate::error::{ClientError, Direction, Result};

/// What to send as the next frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameInput {
    /// XML text, checked for well-formedness before sending.
    Xml(String),
    /// A file holding XML text, read and checked before sending.
    File(PathBuf),
    /// A built document. It is serialized rather than re-checked; the
    /// serializer refuses names, comments and characters that XML forbids.
    Document(Document),
}

impl FrameInput {
    /// Classify an untyped argument.
    ///
    /// An existing regular file is read as a file; anything else is taken as
    /// XML text, so a mistyped path ends up failing the well-formedness check
    /// rather than being sent.
    pub fn detect(arg: impl Into<String>) -> Self {
        let arg = arg.into();
        if Path::new(&arg).is_file() {
            FrameInput::File(PathBuf::from(arg))
        } else {
            FrameInput::Xml(arg)
        }
    }

    /// Read, check and serialize the input into the bytes to frame.
    pub fn into_payload(self) -> Result<Payload> {
        let bytes = match self {
            FrameInput::Xml(text) => {
                checked(text.as_bytes())?;
                text.into_bytes()
            }
            FrameInput::File(path) => {
                let payload = match std::fs::read(&path) {
                    Ok(payload) => payload,
                    Err(source) => return Err(ClientError::Input { path, source }),
                };
                checked(&payload)?;
                payload
            }
            FrameInput::Document(document) => document
                .to_bytes()
                .map_err(|err| ClientError::xml(Direction::Outbound, err))?,
        };
        Ok(Payload(bytes))
    }
}

/// Frame payload that passed the checks in [`FrameInput::into_payload`].
///
/// Only that method builds one, so sending a `Payload` skips the checks
/// without skipping validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload(Vec<u8>);

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for Payload {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn checked(payload: &[u8]) -> Result<()> {
    eppwire_xml::validate(payload)
        .map_err(|source| ClientError::syntax(Direction::Outbound, source))
}

impl From<String> for FrameInput {
    fn from(text: String) -> Self {
        FrameInput::Xml(text)
    }
}

impl From<&str> for FrameInput {
    fn from(text: &str) -> Self {
        FrameInput::Xml(text.to_string())
    }
}

impl From<PathBuf> for FrameInput {
    fn from(path: PathBuf) -> Self {
        FrameInput::File(path)
    }
}

impl From<&Path> for FrameInput {
    fn from(path: &Path) -> Self {
        FrameInput::File(path.to_path_buf())
    }
}

impl From<Document> for FrameInput {
    fn from(document: Document) -> Self {
        FrameInput::Document(document)
    }
}

impl From<Element> for FrameInput {
    fn from(root: Element) -> Self {
        FrameInput::Document(Document::new(root))
    }
}
