use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::trace;

use crate::error::SyntaxError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Structural markup reported by [`scan`], in document order.
///
/// Only markup inside the root element is reported; the prolog and
/// trailing misc are checked but not forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Markup {
    Open {
        name: String,
        attributes: Vec<(String, String)>,
        empty: bool,
    },
    Close,
    Text(String),
    CData(String),
    Comment(String),
}

/// Check that `payload` is a well-formed XML document.
///
/// Only syntax is checked: UTF-8 encoding and the XML character range, tag
/// nesting and names, a single root element, no character data outside the
/// root, comment and attribute syntax, and entity references. No DTD or
/// schema is loaded.
pub fn validate(payload: &[u8]) -> Result<(), SyntaxError> {
    scan(payload, |_| {})
}

/// Walk a payload, enforcing well-formedness and feeding markup to `sink`.
pub(crate) fn scan<F>(payload: &[u8], mut sink: F) -> Result<(), SyntaxError>
where
    F: FnMut(Markup),
{
    let (skip, body) = match payload.strip_prefix(UTF8_BOM) {
        Some(rest) => (UTF8_BOM.len(), rest),
        None => (0, payload),
    };
    let fail = |message: String, at: usize| SyntaxError::new(message, skip + at, payload);

    let text = std::str::from_utf8(body).map_err(|err| {
        fail(
            format!("document is not valid UTF-8: {err}"),
            err.valid_up_to(),
        )
    })?;

    if let Some((at, c)) = text.char_indices().find(|&(_, c)| !is_xml_char(c)) {
        return Err(fail(
            format!("character U+{:04X} is not allowed in XML", u32::from(c)),
            at,
        ));
    }

    let mut reader = Reader::from_str(text);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.check_comments = true;

    let mut open: Vec<String> = Vec::new();
    let mut root_seen = false;
    let mut doctype_seen = false;
    let mut first_event = true;

    loop {
        let at = position(reader.buffer_position());
        let event = reader
            .read_event()
            .map_err(|err| fail(err.to_string(), position(reader.error_position())))?;

        match event {
            Event::Decl(_) if !first_event => {
                return Err(fail(
                    "XML declaration is only allowed at the start of the document".to_string(),
                    at,
                ));
            }
            Event::Start(ref start) | Event::Empty(ref start) => {
                if open.is_empty() && root_seen {
                    return Err(fail(
                        format!(
                            "second root element <{}>: a document has exactly one root",
                            element_name(start)
                        ),
                        at,
                    ));
                }
                let name = element_name(start);
                if !is_name(&name) {
                    return Err(fail(format!("invalid element name '{name}'"), at));
                }
                let attributes = read_attributes(start).map_err(|message| fail(message, at))?;
                let empty = matches!(event, Event::Empty(_));
                root_seen = true;
                if !empty {
                    open.push(name.clone());
                }
                sink(Markup::Open {
                    name,
                    attributes,
                    empty,
                });
            }
            Event::End(ref end) => {
                let found = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                match open.pop() {
                    Some(expected) if expected == found => sink(Markup::Close),
                    Some(expected) => {
                        return Err(fail(
                            format!("mismatched end tag: expected </{expected}>, found </{found}>"),
                            at,
                        ));
                    }
                    None => {
                        return Err(fail(
                            format!("end tag </{found}> has no matching start tag"),
                            at,
                        ));
                    }
                }
            }
            Event::Text(ref content) => {
                if let Some(idx) = content.windows(3).position(|w| w == b"]]>") {
                    return Err(fail(
                        "']]>' is not allowed in character data".to_string(),
                        at + idx,
                    ));
                }
                let value = content
                    .unescape()
                    .map_err(|err| fail(err.to_string(), at))?;
                if let Some(c) = value.chars().find(|&c| !is_xml_char(c)) {
                    return Err(fail(
                        format!("character reference to U+{:04X} is not allowed", u32::from(c)),
                        at,
                    ));
                }
                if open.is_empty() {
                    if !value.trim().is_empty() {
                        return Err(fail(
                            "character data outside the root element".to_string(),
                            at,
                        ));
                    }
                } else {
                    sink(Markup::Text(value.into_owned()));
                }
            }
            Event::CData(ref content) => {
                if open.is_empty() {
                    return Err(fail("CDATA section outside the root element".to_string(), at));
                }
                sink(Markup::CData(
                    String::from_utf8_lossy(content.as_ref()).into_owned(),
                ));
            }
            Event::Comment(ref content) => {
                if content.windows(2).any(|w| w == b"--") || content.ends_with(b"-") {
                    return Err(fail("'--' is not allowed inside a comment".to_string(), at));
                }
                if !open.is_empty() {
                    sink(Markup::Comment(
                        String::from_utf8_lossy(content.as_ref()).into_owned(),
                    ));
                }
            }
            Event::DocType(_) if root_seen => {
                return Err(fail(
                    "document type declaration after the root element".to_string(),
                    at,
                ));
            }
            Event::DocType(_) if doctype_seen => {
                return Err(fail(
                    "a document has at most one document type declaration".to_string(),
                    at,
                ));
            }
            Event::DocType(_) => doctype_seen = true,
            Event::Eof => break,
            _ => {}
        }
        first_event = false;
    }

    let end = body.len();
    if let Some(unclosed) = open.last() {
        return Err(fail(
            format!("unexpected end of document: element <{unclosed}> is not closed"),
            end,
        ));
    }
    if !root_seen {
        return Err(fail("document has no root element".to_string(), end));
    }

    trace!(bytes = payload.len(), "payload is well-formed");
    Ok(())
}

fn element_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

fn read_attributes(start: &BytesStart<'_>) -> Result<Vec<(String, String)>, String> {
    check_attribute_spacing(start.attributes_raw())
        .map_err(|message| format!("in <{}>: {message}", element_name(start)))?;

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|err| format!("in <{}>: {err}", element_name(start)))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        if !is_name(&key) {
            return Err(format!("invalid attribute name '{key}'"));
        }
        let value = attr
            .unescape_value()
            .map_err(|err| format!("attribute '{key}': {err}"))?
            .into_owned();
        if let Some(c) = value.chars().find(|&c| !is_xml_char(c)) {
            return Err(format!(
                "attribute '{key}': character U+{:04X} is not allowed",
                u32::from(c)
            ));
        }
        attributes.push((key, value));
    }
    Ok(attributes)
}

/// Every quoted value must be followed by whitespace or the end of the tag.
fn check_attribute_spacing(raw: &[u8]) -> Result<(), String> {
    let mut quote = None;
    for (idx, &byte) in raw.iter().enumerate() {
        match quote {
            Some(open) if byte == open => {
                quote = None;
                if let Some(next) = raw.get(idx + 1) {
                    if !is_space(*next) {
                        return Err("attributes must be separated by whitespace".to_string());
                    }
                }
            }
            Some(_) => {}
            None if byte == b'"' || byte == b'\'' => quote = Some(byte),
            None => {}
        }
    }
    Ok(())
}

fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n')
}

/// The XML 1.0 `Char` production.
pub(crate) fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\u{9}' | '\u{A}' | '\u{D}'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

/// The XML 1.0 `Name` production.
pub(crate) fn is_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_name_start_char(first) => chars.all(is_name_char),
        _ => false,
    }
}

fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}'
            | '\u{300}'..='\u{36F}'
            | '\u{203F}'..='\u{2040}')
}

fn position<P>(pos: P) -> usize
where
    usize: TryFrom<P>,
{
    usize::try_from(pos).unwrap_or(usize::MAX)
}
