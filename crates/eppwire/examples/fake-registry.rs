//! Minimal plaintext registry stand-in: greets, then answers every frame
//! with a fixed response until the client disconnects.
//!
//! Run with:
//!   cargo run --example fake-registry
//!
//! In another terminal:
//!   cargo run --features cli -- send 127.0.0.1 --port 7700 \
//!     --xml '<epp><hello/></epp>' --wait

use std::io::{Read, Write};
use std::net::TcpListener;

use eppwire::frame::{encode, FrameReader};

const GREETING: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<epp xmlns="urn:ietf:params:xml:ns:epp-1.0"><greeting><svID>fake-registry</svID></greeting></epp>"#;

const RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<epp xmlns="urn:ietf:params:xml:ns:epp-1.0"><response><result code="1000"><msg>Command completed successfully</msg></result></response></epp>"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let port = std::env::var("FAKE_REGISTRY_PORT").unwrap_or_else(|_| "7700".to_string());
    let listener = TcpListener::bind(format!("127.0.0.1:{port}"))?;
    eprintln!("Listening on {}", listener.local_addr()?);

    let (mut sock, addr) = listener.accept()?;
    eprintln!("Client connected: {addr}");
    sock.write_all(&encode(GREETING.as_bytes())?)?;

    let mut reader = FrameReader::new(sock.try_clone()?);
    loop {
        match reader.read_frame() {
            Ok(frame) => {
                eprintln!("Received {} byte frame", frame.payload.len());
                eppwire::xml::validate(&frame.payload)?;
                sock.write_all(&encode(RESPONSE.as_bytes())?)?;
            }
            Err(e) => {
                eprintln!("Client disconnected: {e}");
                break;
            }
        }
    }

    let mut rest = Vec::new();
    let _ = sock.read_to_end(&mut rest);
    Ok(())
}
