use std::time::Duration;

use eppwire_frame::FrameConfig;
use eppwire_transport::{TlsOptions, DEFAULT_PORT};

use crate::error::{ClientError, Result};

/// Where and how to reach the server. Fixed once a client is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    host: String,
    port: u16,
    tls: bool,
}

impl ConnectionParams {
    /// Validate and build parameters for a plain TCP connection.
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self> {
        let host = host.into();
        if host.is_empty() {
            return Err(ClientError::Configuration("host must not be empty".to_string()));
        }
        if host.chars().any(char::is_whitespace) {
            return Err(ClientError::Configuration(format!(
                "host '{host}' must not contain whitespace"
            )));
        }
        if port == 0 {
            return Err(ClientError::Configuration(
                "port must be between 1 and 65535".to_string(),
            ));
        }
        Ok(Self {
            host,
            port,
            tls: false,
        })
    }

    /// Parameters for `host` on the default port (700).
    pub fn for_host(host: impl Into<String>) -> Result<Self> {
        Self::new(host, DEFAULT_PORT)
    }

    /// Upgrade the connection to TLS before any frame is exchanged.
    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn tls(&self) -> bool {
        self.tls
    }
}

/// Per-connection options.
///
/// All timeouts default to `None`: connects wait for the OS, and reads and
/// writes block until the peer acts or the connection drops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectOptions {
    /// TLS settings, used only when the parameters ask for TLS.
    pub tls: TlsOptions,
    pub connect_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
    /// Frame size limits.
    pub frame: FrameConfig,
}

impl ConnectOptions {
    pub fn with_tls(mut self, tls: TlsOptions) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("connect timeout", self.connect_timeout),
            ("read timeout", self.read_timeout),
            ("write timeout", self.write_timeout),
        ] {
            if value == Some(Duration::ZERO) {
                return Err(ClientError::Configuration(format!(
                    "{name} must be greater than zero"
                )));
            }
        }
        Ok(())
    }
}
