use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use eppwire_client::{ConnectOptions, ConnectionParams, EppClient, FrameInput};
use eppwire_transport::{TlsOptions, DEFAULT_PORT};

use crate::exit::{client_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod greet;
pub mod send;
pub mod validate;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect, print the server greeting, disconnect.
    Greet(GreetArgs),
    /// Send a single frame.
    Send(SendArgs),
    /// Check XML for well-formedness without connecting.
    Validate(ValidateArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Greet(args) => greet::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Validate(args) => validate::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Connection flags shared by commands that talk to a server.
#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Server port.
    #[arg(long, short = 'p', default_value_t = DEFAULT_PORT, env = "EPPWIRE_PORT")]
    pub port: u16,
    /// Upgrade the connection to TLS.
    #[arg(long)]
    pub tls: bool,
    /// PEM bundle of trusted CAs (replaces the built-in roots).
    #[arg(long, value_name = "PATH", requires = "tls")]
    pub ca_file: Option<PathBuf>,
    /// PEM client certificate chain.
    #[arg(long, value_name = "PATH", requires = "tls")]
    pub cert_file: Option<PathBuf>,
    /// PEM client private key (defaults to the certificate file).
    #[arg(long, value_name = "PATH", requires = "cert_file")]
    pub key_file: Option<PathBuf>,
    /// Name to verify the server certificate against (defaults to HOST).
    #[arg(long, value_name = "NAME", requires = "tls")]
    pub server_name: Option<String>,
    /// Maximum time to establish the connection (e.g. 5s, 500ms).
    #[arg(long, value_name = "DURATION", default_value = "10s")]
    pub connect_timeout: String,
    /// Maximum time to wait for each frame from the server.
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<String>,
}

impl ConnectArgs {
    pub fn params(&self, host: &str) -> CliResult<ConnectionParams> {
        ConnectionParams::new(host, self.port)
            .map(|params| params.with_tls(self.tls))
            .map_err(|err| client_error("invalid connection parameters", err))
    }

    pub fn options(&self) -> CliResult<ConnectOptions> {
        let mut options = ConnectOptions::default()
            .with_tls(TlsOptions {
                ca_file: self.ca_file.clone(),
                cert_file: self.cert_file.clone(),
                key_file: self.key_file.clone(),
                server_name: self.server_name.clone(),
            })
            .with_connect_timeout(parse_duration(&self.connect_timeout)?);
        if let Some(timeout) = &self.timeout {
            let timeout = parse_duration(timeout)?;
            options = options.with_read_timeout(timeout).with_write_timeout(timeout);
        }
        Ok(options)
    }

    /// Build a raw client and connect it, returning the greeting payload.
    pub fn connect(&self, host: &str) -> CliResult<(EppClient, Vec<u8>)> {
        let params = self.params(host)?;
        let options = self.options()?;
        let mut client = EppClient::new(params);
        let greeting = client
            .connect_with(&options)
            .map_err(|err| client_error("connect failed", err))?;
        Ok((client, greeting.to_vec()))
    }
}

/// Where a frame's XML comes from. Exactly one is required.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct PayloadArgs {
    /// XML text.
    #[arg(long, value_name = "XML")]
    pub xml: Option<String>,
    /// File holding XML text.
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
    /// A file path if one exists, otherwise XML text.
    #[arg(long, value_name = "XML_OR_PATH")]
    pub frame: Option<String>,
}

impl PayloadArgs {
    pub fn input(&self) -> CliResult<FrameInput> {
        if let Some(xml) = &self.xml {
            return Ok(FrameInput::Xml(xml.clone()));
        }
        if let Some(path) = &self.file {
            return Ok(FrameInput::File(path.clone()));
        }
        if let Some(arg) = &self.frame {
            return Ok(FrameInput::detect(arg.clone()));
        }
        Err(CliError::new(USAGE, "one of --xml, --file or --frame is required"))
    }
}

#[derive(Args, Debug)]
pub struct GreetArgs {
    /// Server host name or address.
    pub host: String,
    #[command(flatten)]
    pub conn: ConnectArgs,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Server host name or address.
    pub host: String,
    #[command(flatten)]
    pub payload: PayloadArgs,
    /// Wait for one response frame and print it.
    #[arg(long)]
    pub wait: bool,
    #[command(flatten)]
    pub conn: ConnectArgs,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub payload: PayloadArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else if let Some(num) = input.strip_suffix('m') {
        (num, "m")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "m" => Ok(Duration::from_secs(value.saturating_mul(60))),
        _ => Ok(Duration::from_secs(value)),
    }
}
