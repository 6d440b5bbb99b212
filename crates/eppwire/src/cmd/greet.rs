use tracing::info;

use crate::cmd::GreetArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_frame, FrameKind, OutputFormat};

pub fn run(args: GreetArgs, format: OutputFormat) -> CliResult<i32> {
    let (mut client, greeting) = args.conn.connect(&args.host)?;
    let server = server_label(&args.host, client.peer().map(|addr| addr.port()), args.conn.port);
    client.disconnect();

    info!(server = %server, bytes = greeting.len(), "greeting received");
    print_frame(FrameKind::Greeting, &server, &greeting, format);
    Ok(SUCCESS)
}

pub(crate) fn server_label(host: &str, peer_port: Option<u16>, port: u16) -> String {
    format!("{host}:{}", peer_port.unwrap_or(port))
}
