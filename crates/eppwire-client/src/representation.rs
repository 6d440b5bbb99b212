use bytes::Bytes;
use eppwire_xml::{Document, ScratchSpace};
use tracing::debug;

use crate::error::{ClientError, Direction, Result};

/// How received frames are handed back to the caller.
///
/// Chosen once, when the client is built.
pub trait Representation {
    type Output;

    /// Turn a received payload into the caller-facing value.
    fn convert(&self, payload: Bytes) -> Result<Self::Output>;
}

/// Frames are returned as the raw payload bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawXml;

impl Representation for RawXml {
    type Output = Bytes;

    fn convert(&self, payload: Bytes) -> Result<Bytes> {
        Ok(payload)
    }
}

/// Frames are parsed into a [`Document`].
///
/// With a scratch space, each payload is first written to its own temporary
/// file and parsed from disk; the file is removed whether or not parsing
/// succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDocument {
    scratch: Option<ScratchSpace>,
}

impl ParsedDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scratch(scratch: ScratchSpace) -> Self {
        Self {
            scratch: Some(scratch),
        }
    }

    pub fn scratch(&self) -> Option<&ScratchSpace> {
        self.scratch.as_ref()
    }
}

impl Representation for ParsedDocument {
    type Output = Document;

    fn convert(&self, payload: Bytes) -> Result<Document> {
        let Some(space) = &self.scratch else {
            return Document::parse(&payload)
                .map_err(|source| ClientError::syntax(Direction::Inbound, source));
        };

        let file = space
            .materialize(&payload)
            .map_err(|err| ClientError::xml(Direction::Inbound, err))?;
        let parsed = file.reopen().and_then(Document::parse_reader);
        debug!(
            path = %file.path().display(),
            ok = parsed.is_ok(),
            "parsed frame from scratch file"
        );
        drop(file);

        parsed.map_err(|err| ClientError::xml(Direction::Inbound, err))
    }
}

#[cfg(test)]
mod tests {
    use eppwire_xml::XmlError;

    use super::*;

    fn entries(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir).expect("read dir").count()
    }

    #[test]
    fn raw_is_passthrough() {
        let payload = Bytes::from_static(b"not even xml");
        assert_eq!(RawXml.convert(payload.clone()).expect("raw"), payload);
    }

    #[test]
    fn parsed_in_memory() {
        let doc = ParsedDocument::new()
            .convert(Bytes::from_static(b"<epp><greeting/></epp>"))
            .expect("parse");
        assert_eq!(doc.root().name(), "epp");
        assert!(doc.root().find("greeting").is_some());
    }

    #[test]
    fn parsed_rejects_malformed_as_inbound_syntax() {
        let err = ParsedDocument::new()
            .convert(Bytes::from_static(b"<epp><greeting></epp>"))
            .unwrap_err();
        match err {
            ClientError::Syntax { direction, source } => {
                assert_eq!(direction, Direction::Inbound);
                assert_eq!(source.document(), "<epp><greeting></epp>");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn scratch_file_removed_after_success() {
        let dir = tempfile::tempdir().expect("temp dir");
        let repr = ParsedDocument::with_scratch(ScratchSpace::new(dir.path()));

        let doc = repr
            .convert(Bytes::from_static(b"<epp><greeting/></epp>"))
            .expect("parse");
        assert_eq!(doc.root().name(), "epp");
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn scratch_file_removed_after_parse_failure() {
        let dir = tempfile::tempdir().expect("temp dir");
        let repr = ParsedDocument::with_scratch(ScratchSpace::new(dir.path()));

        let err = repr
            .convert(Bytes::from_static(b"<epp><greeting>"))
            .unwrap_err();
        assert!(matches!(err, ClientError::Syntax { .. }));
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn missing_scratch_dir_is_xml_error() {
        let repr =
            ParsedDocument::with_scratch(ScratchSpace::new("/nonexistent/eppwire/scratch"));
        let err = repr
            .convert(Bytes::from_static(b"<epp/>"))
            .unwrap_err();
        assert!(matches!(err, ClientError::Xml(XmlError::Scratch { .. })));
    }
}
