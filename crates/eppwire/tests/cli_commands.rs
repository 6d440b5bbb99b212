#![cfg(feature = "cli")]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::Command;
use std::thread::{self, JoinHandle};

use eppwire::frame::{encode, FrameReader};

const GREETING: &[u8] = b"<epp><greeting/></epp>";
const RESPONSE: &[u8] = b"<epp><response><result code=\"1000\"/></response></epp>";

fn eppwire() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_eppwire"));
    cmd.env_remove("EPPWIRE_PORT")
        .arg("--log-level")
        .arg("error");
    cmd
}

/// Accept one client, greet it, answer up to `replies` frames, and return
/// every request payload received.
fn fake_registry(replies: usize) -> (u16, JoinHandle<Vec<Vec<u8>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
    let port = listener.local_addr().expect("listener has address").port();
    let handle = thread::spawn(move || {
        let (mut sock, _) = listener.accept().expect("listener should accept");
        sock.write_all(&encode(GREETING).expect("encode greeting"))
            .expect("greeting should be written");

        let mut reader = FrameReader::new(sock.try_clone().expect("clone socket"));
        let mut requests = Vec::new();
        while let Ok(frame) = reader.read_frame() {
            requests.push(frame.payload.to_vec());
            if requests.len() <= replies {
                sock.write_all(&encode(RESPONSE).expect("encode response"))
                    .expect("response should be written");
            }
        }
        requests
    });
    (port, handle)
}

fn drain(mut sock: TcpStream) {
    let mut sink = Vec::new();
    let _ = sock.read_to_end(&mut sink);
}

#[test]
fn greet_prints_greeting_as_json() {
    let (port, server) = fake_registry(0);

    let output = eppwire()
        .args(["--format", "json", "greet", "127.0.0.1", "--port"])
        .arg(port.to_string())
        .output()
        .expect("greet should run");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"kind\":\"greeting\""), "{stdout}");
    assert!(stdout.contains("\"payload_size\":22"), "{stdout}");
    assert!(stdout.contains("<epp><greeting/></epp>"), "{stdout}");

    assert!(server.join().expect("server thread").is_empty());
}

#[test]
fn send_wait_prints_raw_response() {
    let (port, server) = fake_registry(1);

    let output = eppwire()
        .args(["--format", "raw", "send", "127.0.0.1", "--port"])
        .arg(port.to_string())
        .args(["--xml", "<epp><hello/></epp>", "--wait", "--timeout", "5s"])
        .output()
        .expect("send should run");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(output.stdout, RESPONSE);

    let requests = server.join().expect("server thread");
    assert_eq!(requests, vec![b"<epp><hello/></epp>".to_vec()]);
}

#[test]
fn send_file_is_read_once_before_connecting() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(b"<epp><hello/></epp>").expect("write");
    let path = file.path().to_path_buf();

    let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
    let port = listener.local_addr().expect("listener has address").port();
    let rewrite = path.clone();
    let server = thread::spawn(move || {
        let (mut sock, _) = listener.accept().expect("listener should accept");
        // a second read of the file after connecting would pick this up
        std::fs::write(&rewrite, b"<epp><changed/></epp>").expect("rewrite");
        sock.write_all(&encode(GREETING).expect("encode greeting"))
            .expect("greeting should be written");
        let mut reader = FrameReader::new(sock);
        reader
            .read_frame()
            .map(|frame| frame.payload.to_vec())
            .expect("request frame")
    });

    let output = eppwire()
        .args(["send", "127.0.0.1", "--port"])
        .arg(port.to_string())
        .arg("--file")
        .arg(&path)
        .output()
        .expect("send should run");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(server.join().expect("server thread"), b"<epp><hello/></epp>");
}

#[test]
fn send_rejects_malformed_xml_without_connecting() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
    let port = listener.local_addr().expect("listener has address").port();
    listener
        .set_nonblocking(true)
        .expect("listener should become nonblocking");

    let output = eppwire()
        .args(["send", "127.0.0.1", "--port"])
        .arg(port.to_string())
        .args(["--frame", "/nonexistent/eppwire/logout.xml"])
        .output()
        .expect("send should run");

    assert_eq!(output.status.code(), Some(60));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("/nonexistent/eppwire/logout.xml"), "{stderr}");
    match listener.accept() {
        Ok((sock, _)) => {
            drain(sock);
            panic!("client should not have connected");
        }
        Err(err) => assert_eq!(err.kind(), std::io::ErrorKind::WouldBlock),
    }
}

#[test]
fn send_to_closed_port_is_transport_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
        listener.local_addr().expect("listener has address").port()
    };

    let output = eppwire()
        .args(["send", "127.0.0.1", "--port"])
        .arg(port.to_string())
        .args(["--xml", "<epp><hello/></epp>"])
        .output()
        .expect("send should run");

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("connect failed"), "{stderr}");
}

#[test]
fn validate_accepts_well_formed_text() {
    let output = eppwire()
        .args(["--format", "json", "validate", "--xml", "<epp><hello/></epp>"])
        .output()
        .expect("validate should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"valid\":true"), "{stdout}");
}

#[test]
fn validate_reports_mismatch_with_exit_60() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(b"<epp>\n  <hello>\n</epp>\n").expect("write");

    let output = eppwire()
        .args(["--format", "json", "validate", "--file"])
        .arg(file.path())
        .output()
        .expect("validate should run");

    assert_eq!(output.status.code(), Some(60));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"valid\":false"), "{stdout}");
    assert!(stdout.contains("\"line\":3"), "{stdout}");
    assert!(stdout.contains("</hello>"), "{stdout}");
}

#[test]
fn validate_missing_file_is_usage_error() {
    let output = eppwire()
        .args(["validate", "--file", "/nonexistent/eppwire/hello.xml"])
        .output()
        .expect("validate should run");

    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn version_prints_package_version() {
    let output = eppwire()
        .arg("version")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("eppwire {}", env!("CARGO_PKG_VERSION"))
    );
}
