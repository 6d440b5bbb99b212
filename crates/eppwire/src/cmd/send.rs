use eppwire_client::{EppClient, Payload};
use tracing::debug;

use crate::cmd::greet::server_label;
use crate::cmd::SendArgs;
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::{print_frame, FrameKind, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    // Reject bad text before opening a connection.
    let payload = args
        .payload
        .input()?
        .into_payload()
        .map_err(|err| client_error("invalid frame", err))?;

    let (mut client, greeting) = args.conn.connect(&args.host)?;
    let server = server_label(
        &args.host,
        client.peer().map(|addr| addr.port()),
        args.conn.port,
    );
    debug!(server = %server, bytes = greeting.len(), "greeting received");

    let result = exchange(&mut client, &payload, args.wait);
    client.disconnect();

    if let Some(response) = result? {
        print_frame(FrameKind::Response, &server, &response, format);
    }
    Ok(SUCCESS)
}

fn exchange(client: &mut EppClient, payload: &Payload, wait: bool) -> CliResult<Option<Vec<u8>>> {
    client
        .send_payload(payload)
        .map_err(|err| client_error("send failed", err))?;
    if !wait {
        return Ok(None);
    }
    let response = client
        .get_frame()
        .map_err(|err| client_error("receive failed", err))?;
    Ok(Some(response.to_vec()))
}
