//! Loopback servers for exercising sessions against real sockets.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use rustls::{ServerConfig, ServerConnection, StreamOwned};

pub(crate) const GREETING: &[u8] = b"<epp><greeting/></epp>";

/// Wire bytes of one frame.
pub(crate) fn frame(payload: &[u8]) -> Vec<u8> {
    eppwire_frame::encode(payload)
        .expect("payload should fit in a frame")
        .to_vec()
}

/// Accept one connection on a loopback port and run `script` on it.
pub(crate) fn serve<F, T>(script: F) -> (u16, JoinHandle<T>)
where
    F: FnOnce(TcpStream) -> T + Send + 'static,
    T: Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
    let port = listener.local_addr().expect("listener has address").port();
    let handle = thread::spawn(move || {
        let (sock, _) = listener.accept().expect("listener should accept");
        script(sock)
    });
    (port, handle)
}

/// Send the greeting, then collect everything the client writes until it
/// closes the connection.
pub(crate) fn greet_and_record() -> (u16, JoinHandle<Vec<u8>>) {
    serve(|mut sock| {
        sock.write_all(&frame(GREETING)).expect("greeting should be written");
        let mut received = Vec::new();
        let _ = sock.read_to_end(&mut received);
        received
    })
}

/// Send the greeting, then answer each client frame with `reply`.
pub(crate) fn greet_and_reply(
    reply: &'static [u8],
    rounds: usize,
) -> (u16, JoinHandle<Vec<Vec<u8>>>) {
    serve(move |mut sock| {
        sock.write_all(&frame(GREETING)).expect("greeting should be written");
        let mut requests = Vec::new();
        for _ in 0..rounds {
            let mut header = [0u8; 4];
            sock.read_exact(&mut header).expect("request header");
            let total = u32::from_be_bytes(header) as usize;
            let mut body = vec![0u8; total - 4];
            sock.read_exact(&mut body).expect("request body");
            requests.push(body);
            sock.write_all(&frame(reply)).expect("reply should be written");
        }
        let mut rest = Vec::new();
        let _ = sock.read_to_end(&mut rest);
        requests
    })
}

/// PEM fixtures shared with the transport crate's tests.
pub(crate) fn tls_fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../eppwire-transport/testdata")
        .join(name)
}

fn tls_server_config() -> Arc<ServerConfig> {
    let mut certs = BufReader::new(File::open(tls_fixture("server.pem")).expect("server cert"));
    let certs = rustls_pemfile::certs(&mut certs)
        .collect::<std::io::Result<Vec<_>>>()
        .expect("server cert should parse");
    let mut key = BufReader::new(File::open(tls_fixture("server-key.pem")).expect("server key"));
    let key = rustls_pemfile::private_key(&mut key)
        .expect("server key should parse")
        .expect("server key should be present");
    let config =
        ServerConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
            .with_safe_default_protocol_versions()
            .expect("protocol versions")
            .with_no_client_auth()
            .with_single_cert(certs, key)
            .expect("server certificate should be accepted");
    Arc::new(config)
}

/// Like [`serve`], but the accepted socket is wrapped in a TLS server
/// session for 127.0.0.1, trusted through `tls_fixture("ca.pem")`.
pub(crate) fn serve_tls<F, T>(script: F) -> (u16, JoinHandle<T>)
where
    F: FnOnce(StreamOwned<ServerConnection, TcpStream>) -> T + Send + 'static,
    T: Send + 'static,
{
    let config = tls_server_config();
    serve(move |sock| {
        let conn = ServerConnection::new(config).expect("server connection");
        script(StreamOwned::new(conn, sock))
    })
}
