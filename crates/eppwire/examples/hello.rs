//! Connect to a server, print its greeting, send `<hello/>`, print the reply.
//!
//! Run with:
//!   cargo run --example hello -- 127.0.0.1 7700
//!
//! Pair it with the `fake-registry` example, or pass `tls` as a third
//! argument to reach a real registry on port 700.

use eppwire::client::{ConnectOptions, ConnectionParams, EppClient, ParsedDocument};
use eppwire::xml::Element;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "127.0.0.1".to_string());
    let port = args.next().map(|p| p.parse()).transpose()?.unwrap_or(7700);
    let tls = args.next().as_deref() == Some("tls");

    let params = ConnectionParams::new(host, port)?.with_tls(tls);
    let mut client = EppClient::with_representation(params, ParsedDocument::new());

    let options = ConnectOptions::default()
        .with_connect_timeout(std::time::Duration::from_secs(10))
        .with_read_timeout(std::time::Duration::from_secs(30));
    let greeting = client.connect_with(&options)?;
    println!("{}", greeting.to_xml_string()?);

    let hello = Element::new("epp")
        .with_attribute("xmlns", "urn:ietf:params:xml:ns:epp-1.0")
        .with_child(Element::new("hello"));
    let reply = client.request(hello)?;
    println!("{}", reply.to_xml_string()?);

    client.disconnect();
    Ok(())
}
