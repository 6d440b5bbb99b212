use std::net::SocketAddr;

use bytes::Bytes;
use tracing::debug;

use crate::config::{ConnectOptions, ConnectionParams};
use crate::error::{ClientError, Result};
use crate::input::{FrameInput, Payload};
use crate::representation::{RawXml, Representation};
use crate::session::{Session, SessionState};

/// A blocking client for one server connection at a time.
///
/// `R` decides what received frames look like: [`RawXml`] hands back the
/// payload bytes, [`crate::ParsedDocument`] a parsed document.
///
/// ```no_run
/// use eppwire_client::{ConnectionParams, EppClient};
///
/// # fn main() -> eppwire_client::Result<()> {
/// let params = ConnectionParams::for_host("epp.example.test")?.with_tls(true);
/// let mut client = EppClient::new(params);
/// let greeting = client.connect()?;
/// println!("{}", String::from_utf8_lossy(&greeting));
/// let response = client.request("<epp><hello/></epp>")?;
/// println!("{}", String::from_utf8_lossy(&response));
/// client.disconnect();
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct EppClient<R: Representation = RawXml> {
    params: ConnectionParams,
    representation: R,
    session: Session,
    greeting: Option<Bytes>,
}

impl EppClient<RawXml> {
    /// A client returning raw payload bytes.
    pub fn new(params: ConnectionParams) -> Self {
        Self::with_representation(params, RawXml)
    }
}

impl<R: Representation> EppClient<R> {
    pub fn with_representation(params: ConnectionParams, representation: R) -> Self {
        Self {
            params,
            representation,
            session: Session::new(),
            greeting: None,
        }
    }

    /// Connect with default options and return the server greeting.
    pub fn connect(&mut self) -> Result<R::Output> {
        self.connect_with(&ConnectOptions::default())
    }

    /// Connect and return the server greeting.
    ///
    /// The raw greeting stays available from [`EppClient::greeting`].
    pub fn connect_with(&mut self, options: &ConnectOptions) -> Result<R::Output> {
        self.greeting = None;
        let greeting = self.session.open(&self.params, options)?;
        self.greeting = Some(greeting.clone());
        self.representation.convert(greeting)
    }

    /// Send one frame.
    ///
    /// Text and file input must be well-formed XML; otherwise nothing is
    /// written and a syntax error carrying the text is returned.
    pub fn send_frame(&mut self, input: impl Into<FrameInput>) -> Result<()> {
        if !self.session.is_connected() {
            return Err(ClientError::NotConnected);
        }
        let payload = input.into().into_payload()?;
        self.send_payload(&payload)
    }

    /// Send a payload that was already prepared with
    /// [`FrameInput::into_payload`].
    pub fn send_payload(&mut self, payload: &Payload) -> Result<()> {
        self.session.send(payload.as_bytes())
    }

    /// Wait for the next frame.
    pub fn get_frame(&mut self) -> Result<R::Output> {
        let payload = self.session.receive()?;
        self.representation.convert(payload)
    }

    /// Send one frame and wait for the answer.
    pub fn request(&mut self, input: impl Into<FrameInput>) -> Result<R::Output> {
        self.send_frame(input)?;
        self.get_frame()
    }

    /// Drop the connection. Sends nothing; safe to repeat.
    pub fn disconnect(&mut self) {
        debug!(host = self.params.host(), "disconnect");
        self.session.close();
    }

    /// Raw payload of the greeting from the most recent connect.
    pub fn greeting(&self) -> Option<&Bytes> {
        self.greeting.as_ref()
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    pub fn representation(&self) -> &R {
        &self.representation
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.session.peer()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::time::Duration;

    use eppwire_xml::{Element, ScratchSpace};

    use super::*;
    use crate::representation::ParsedDocument;
    use crate::testing::{frame, greet_and_record, greet_and_reply, serve, GREETING};

    fn params(port: u16) -> ConnectionParams {
        ConnectionParams::new("127.0.0.1", port).expect("params should be valid")
    }

    #[test]
    fn connect_returns_greeting_without_explicit_receive() {
        let (port, server) = greet_and_record();
        let mut client = EppClient::new(params(port));

        let greeting = client.connect().expect("connect should succeed");
        assert_eq!(greeting.as_ref(), b"<epp><greeting/></epp>");
        assert_eq!(client.greeting().map(|g| g.len()), Some(22));
        assert!(client.is_connected());

        client.disconnect();
        assert!(server.join().expect("server thread").is_empty());
    }

    #[test]
    fn send_frame_writes_length_prefixed_payload() {
        let (port, server) = greet_and_record();
        let mut client = EppClient::new(params(port));
        client.connect().expect("connect");

        client
            .send_frame("<epp><logout/></epp>")
            .expect("send should succeed");
        client.disconnect();

        let wire = server.join().expect("server thread");
        assert_eq!(&wire[..4], &[0x00, 0x00, 0x00, 0x18]);
        assert_eq!(&wire[4..], b"<epp><logout/></epp>");
    }

    #[test]
    fn missing_path_fails_validation_and_sends_nothing() {
        let (port, server) = greet_and_record();
        let mut client = EppClient::new(params(port));
        client.connect().expect("connect");

        let err = client
            .send_frame(FrameInput::detect("/nonexistent/eppwire/logout.xml"))
            .unwrap_err();
        match &err {
            ClientError::Syntax { source, .. } => {
                assert_eq!(source.document(), "/nonexistent/eppwire/logout.xml");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("/nonexistent/eppwire/logout.xml"));
        assert!(client.is_connected());

        client.disconnect();
        assert!(server.join().expect("server thread").is_empty());
    }

    #[test]
    fn prepared_payload_is_sent_as_is() {
        let (port, server) = greet_and_record();
        let mut client = EppClient::new(params(port));
        let payload = FrameInput::from("<epp><logout/></epp>")
            .into_payload()
            .expect("payload");
        client.connect().expect("connect");

        client.send_payload(&payload).expect("send");
        client.disconnect();

        let wire = server.join().expect("server thread");
        assert_eq!(&wire[..4], &[0x00, 0x00, 0x00, 0x18]);
        assert_eq!(&wire[4..], payload.as_bytes());
        assert!(matches!(
            client.send_payload(&payload),
            Err(ClientError::NotConnected)
        ));
    }

    #[test]
    fn request_sends_and_receives() {
        let (port, server) = greet_and_reply(b"<epp><response/></epp>", 2);
        let mut client = EppClient::new(params(port));
        client.connect().expect("connect");

        let first = client.request("<epp><hello/></epp>").expect("first");
        let second = client
            .request(Element::new("epp").with_child(Element::new("hello")))
            .expect("second");
        assert_eq!(first.as_ref(), b"<epp><response/></epp>");
        assert_eq!(second, first);

        client.disconnect();
        let requests = server.join().expect("server thread");
        assert_eq!(requests[0], b"<epp><hello/></epp>");
        assert!(String::from_utf8_lossy(&requests[1]).starts_with("<?xml version=\"1.0\""));
    }

    #[test]
    fn operations_after_disconnect_are_not_connected() {
        let (port, server) = greet_and_record();
        let mut client = EppClient::new(params(port));
        client.connect().expect("connect");

        client.disconnect();
        client.disconnect();
        assert_eq!(client.state(), SessionState::Closed);
        assert!(matches!(
            client.send_frame("<epp><hello/></epp>"),
            Err(ClientError::NotConnected)
        ));
        assert!(matches!(client.get_frame(), Err(ClientError::NotConnected)));
        server.join().expect("server thread");
    }

    #[test]
    fn send_before_connect_is_not_connected() {
        let mut client = EppClient::new(params(700));
        assert_eq!(client.state(), SessionState::Unconnected);
        assert!(matches!(
            client.send_frame("<epp><hello/></epp>"),
            Err(ClientError::NotConnected)
        ));
        assert!(client.greeting().is_none());
    }

    #[test]
    fn parsed_mode_returns_documents() {
        let (port, server) =
            greet_and_reply(br#"<epp><response><result code="1000"/></response></epp>"#, 1);
        let mut client = EppClient::with_representation(params(port), ParsedDocument::new());

        let greeting = client.connect().expect("connect");
        assert_eq!(greeting.root().name(), "epp");
        assert_eq!(client.greeting().map(|g| &g[..]), Some(GREETING));

        let response = client.request("<epp><hello/></epp>").expect("request");
        assert_eq!(
            response.root().find("result").and_then(|r| r.attribute("code")),
            Some("1000")
        );

        client.disconnect();
        server.join().expect("server thread");
    }

    #[test]
    fn parsed_mode_rejects_malformed_server_frame() {
        let (port, server) = serve(|mut sock| {
            sock.write_all(&frame(GREETING)).expect("greeting");
            sock.write_all(&frame(b"<epp><response></epp>")).expect("bad frame");
            let mut sink = Vec::new();
            let _ = sock.read_to_end(&mut sink);
        });
        let dir = tempfile::tempdir().expect("temp dir");
        let repr = ParsedDocument::with_scratch(ScratchSpace::new(dir.path()));
        let mut client = EppClient::with_representation(params(port), repr);

        client.connect().expect("connect");
        let err = client.get_frame().unwrap_err();
        assert!(matches!(err, ClientError::Syntax { .. }), "{err}");
        assert_eq!(std::fs::read_dir(dir.path()).expect("dir").count(), 0);
        // framing is intact, only the content was rejected
        assert!(client.is_connected());

        client.disconnect();
        server.join().expect("server thread");
    }

    #[test]
    fn read_timeout_fails_client() {
        let (port, server) = greet_and_record();
        let mut client = EppClient::new(params(port));
        let options = ConnectOptions::default().with_read_timeout(Duration::from_millis(50));
        client.connect_with(&options).expect("connect");

        assert!(matches!(client.get_frame(), Err(ClientError::Timeout(_))));
        assert_eq!(client.state(), SessionState::Failed);
        assert!(!client.is_connected());
        server.join().expect("server thread");
    }

    #[test]
    fn client_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<EppClient>();
        assert_send::<EppClient<ParsedDocument>>();
    }
}
