use std::fs::File;
use std::io::BufReader;
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName};
use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::stream::EppStream;

/// TLS settings for a registry connection.
///
/// Registries commonly require a client certificate; the key may live in
/// the certificate file itself, in which case `key_file` can stay unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsOptions {
    /// PEM bundle of trusted CA certificates. Replaces the built-in
    /// webpki roots when set.
    pub ca_file: Option<PathBuf>,
    /// PEM client certificate chain.
    pub cert_file: Option<PathBuf>,
    /// PEM private key for the client certificate.
    pub key_file: Option<PathBuf>,
    /// Name to send as SNI and verify the server certificate against.
    /// Defaults to the connection host.
    pub server_name: Option<String>,
}

/// Build a rustls client configuration from options.
pub fn client_config(options: &TlsOptions) -> Result<Arc<ClientConfig>> {
    let roots = match &options.ca_file {
        Some(path) => load_roots(path)?,
        None => {
            let mut roots = RootCertStore::empty();
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
            roots
        }
    };

    let builder =
        ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
            .with_safe_default_protocol_versions()
            .map_err(|err| TransportError::TlsConfig(err.to_string()))?
            .with_root_certificates(roots);

    let config = match (&options.cert_file, &options.key_file) {
        (None, None) => builder.with_no_client_auth(),
        (None, Some(_)) => {
            return Err(TransportError::TlsConfig(
                "key file given without a certificate file".to_string(),
            ));
        }
        (Some(cert_path), key_path) => {
            let certs = load_certs(cert_path)?;
            let key = load_key(key_path.as_deref().unwrap_or(cert_path))?;
            builder
                .with_client_auth_cert(certs, key)
                .map_err(|err| TransportError::TlsConfig(err.to_string()))?
        }
    };

    Ok(Arc::new(config))
}

/// Run the TLS handshake over a connected socket.
pub(crate) fn handshake(
    mut sock: TcpStream,
    host: &str,
    options: &TlsOptions,
) -> Result<EppStream> {
    let config = client_config(options)?;
    let name = options.server_name.as_deref().unwrap_or(host);
    let server_name = ServerName::try_from(name.to_string()).map_err(|err| {
        TransportError::TlsConfig(format!("invalid server name '{name}': {err}"))
    })?;

    let mut conn = ClientConnection::new(config, server_name)
        .map_err(|err| TransportError::TlsConfig(err.to_string()))?;

    while conn.is_handshaking() {
        conn.complete_io(&mut sock)
            .map_err(|source| TransportError::TlsHandshake {
                host: host.to_string(),
                source,
            })?;
    }

    debug!(
        host,
        version = ?conn.protocol_version(),
        suite = ?conn.negotiated_cipher_suite().map(|suite| suite.suite()),
        "tls handshake complete"
    );
    Ok(EppStream::tls(StreamOwned::new(conn, sock)))
}

fn open_pem(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|err| TransportError::TlsFile {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let mut reader = open_pem(path)?;
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|err| TransportError::TlsFile {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;

    if certs.is_empty() {
        return Err(TransportError::TlsFile {
            path: path.to_path_buf(),
            message: "no PEM certificates found".to_string(),
        });
    }
    Ok(certs)
}

fn load_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    let mut reader = open_pem(path)?;
    rustls_pemfile::private_key(&mut reader)
        .map_err(|err| TransportError::TlsFile {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?
        .ok_or_else(|| TransportError::TlsFile {
            path: path.to_path_buf(),
            message: "no PEM private key found".to_string(),
        })
}

fn load_roots(path: &Path) -> Result<RootCertStore> {
    let mut roots = RootCertStore::empty();
    for cert in load_certs(path)? {
        roots.add(cert).map_err(|err| TransportError::TlsFile {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
    }
    Ok(roots)
}
