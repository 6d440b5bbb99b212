use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// What a printed frame was in the exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    Greeting,
    Response,
}

impl FrameKind {
    fn as_str(self) -> &'static str {
        match self {
            FrameKind::Greeting => "greeting",
            FrameKind::Response => "response",
        }
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    kind: FrameKind,
    server: &'a str,
    wire_size: usize,
    payload_size: usize,
    payload: String,
    timestamp: String,
}

#[derive(Serialize)]
struct ValidationOutput<'a> {
    valid: bool,
    source: &'a str,
    size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    column: Option<usize>,
}

/// Outcome of a local well-formedness check.
pub struct Validation<'a> {
    pub source: &'a str,
    pub size: usize,
    pub error: Option<&'a eppwire_xml::SyntaxError>,
}

pub fn print_frame(kind: FrameKind, server: &str, payload: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = FrameOutput {
                kind,
                server,
                wire_size: payload.len() + eppwire_frame::HEADER_SIZE,
                payload_size: payload.len(),
                payload: payload_text(payload),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FRAME", "SERVER", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    kind.as_str().to_string(),
                    server.to_string(),
                    payload.len().to_string(),
                    payload_text(payload),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{} from {} ({} bytes)\n{}",
                kind.as_str(),
                server,
                payload.len(),
                payload_text(payload)
            );
        }
        OutputFormat::Raw => {
            print_raw(payload);
        }
    }
}

pub fn print_validation(result: &Validation<'_>, format: OutputFormat) {
    let message = result.error.map(|err| err.message());
    match format {
        OutputFormat::Json => {
            let out = ValidationOutput {
                valid: result.error.is_none(),
                source: result.source,
                size: result.size,
                error: message,
                line: result.error.map(|err| err.line()),
                column: result.error.map(|err| err.column()),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let position = result
                .error
                .map(|err| format!("{}:{}", err.line(), err.column()))
                .unwrap_or_default();
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SOURCE", "SIZE", "VALID", "POSITION", "ERROR"])
                .add_row(vec![
                    result.source.to_string(),
                    result.size.to_string(),
                    result.error.is_none().to_string(),
                    position,
                    message.unwrap_or_default().to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => match result.error {
            None => println!("{}: well-formed ({} bytes)", result.source, result.size),
            Some(err) => println!("{}: {err}", result.source),
        },
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn payload_text(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_json_shape() {
        let out = FrameOutput {
            kind: FrameKind::Greeting,
            server: "127.0.0.1:700",
            wire_size: 26,
            payload_size: 22,
            payload: payload_text(b"<epp><greeting/></epp>"),
            timestamp: "0".to_string(),
        };
        let json = serde_json::to_string(&out).expect("serialize");
        assert!(json.contains("\"kind\":\"greeting\""));
        assert!(json.contains("\"wire_size\":26"));
    }

    #[test]
    fn validation_json_omits_absent_error() {
        let out = ValidationOutput {
            valid: true,
            source: "--xml",
            size: 19,
            error: None,
            line: None,
            column: None,
        };
        let json = serde_json::to_string(&out).expect("serialize");
        assert_eq!(json, r#"{"valid":true,"source":"--xml","size":19}"#);
    }

    #[test]
    fn binary_payload_is_summarized() {
        assert_eq!(payload_text(&[0xff, 0xfe]), "<binary 2 bytes>");
    }
}
