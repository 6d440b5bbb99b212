use std::path::PathBuf;

/// A well-formedness violation found while scanning an XML payload.
///
/// Carries the position of the first problem and the text that was
/// checked, so callers can show the offending document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at line {line}, column {column}")]
pub struct SyntaxError {
    message: String,
    offset: usize,
    line: usize,
    column: usize,
    document: String,
}

impl SyntaxError {
    pub(crate) fn new(message: impl Into<String>, offset: usize, payload: &[u8]) -> Self {
        let offset = offset.min(payload.len());
        let (line, column) = line_column(payload, offset);
        Self {
            message: message.into(),
            offset,
            line,
            column,
            document: String::from_utf8_lossy(payload).into_owned(),
        }
    }

    /// Description of the violation, without position.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Byte offset into the payload.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// 1-based line number.
    pub fn line(&self) -> usize {
        self.line
    }

    /// 1-based column, counted in characters.
    pub fn column(&self) -> usize {
        self.column
    }

    /// The checked text (lossily decoded when it was not UTF-8).
    pub fn document(&self) -> &str {
        &self.document
    }
}

fn line_column(payload: &[u8], offset: usize) -> (usize, usize) {
    let before = &payload[..offset];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |idx| idx + 1);
    let column = String::from_utf8_lossy(&before[line_start..]).chars().count() + 1;
    (line, column)
}

/// Errors from the XML layer.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// The payload is not well-formed XML.
    #[error("not well-formed XML: {0}")]
    Syntax(#[from] SyntaxError),

    /// A document could not be written out.
    #[error("failed to serialize document: {0}")]
    Serialize(String),

    /// A scratch file could not be created or written.
    #[error("scratch file in {dir}: {source}")]
    Scratch {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading document input failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, XmlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_of_first_line() {
        let err = SyntaxError::new("boom", 5, b"<epp><x>");
        assert_eq!((err.line(), err.column()), (1, 6));
        assert_eq!(err.to_string(), "boom at line 1, column 6");
    }

    #[test]
    fn position_after_newlines() {
        let payload = b"<epp>\n  <x>\n</epp>";
        let err = SyntaxError::new("mismatch", 12, payload);
        assert_eq!(err.line(), 3);
        assert_eq!(err.column(), 1);
        assert_eq!(err.document(), "<epp>\n  <x>\n</epp>");
    }

    #[test]
    fn offset_is_clamped() {
        let err = SyntaxError::new("eof", 100, b"<a>");
        assert_eq!(err.offset(), 3);
        assert_eq!(err.column(), 4);
    }
}
