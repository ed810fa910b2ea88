//! Socket types for SMTP connections.

use crate::config::TransportMode;
use crate::error::{Error, Result};
use rustls::pki_types::{CertificateDer, ServerName};
use std::io;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};

/// SMTP stream (TCP or TLS).
#[derive(Debug)]
pub enum SmtpStream {
    /// Plain TCP connection.
    Tcp(TcpStream),
    /// TLS-encrypted connection (boxed to reduce enum size).
    Tls(Box<TlsStream<TcpStream>>),
}

impl SmtpStream {
    /// Returns the transport mode of this stream.
    #[must_use]
    pub const fn mode(&self) -> TransportMode {
        match self {
            Self::Tcp(_) => TransportMode::Plain,
            Self::Tls(_) => TransportMode::Encrypted,
        }
    }
}

impl AsyncRead for SmtpStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for SmtpStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_flush(cx),
            Self::Tls(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Tls(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}

/// Connects to an SMTP server over plain TCP.
///
/// # Errors
///
/// Returns an error if the connection fails.
pub async fn connect(hostname: &str, port: u16) -> Result<SmtpStream> {
    let addr = format!("{hostname}:{port}");
    let stream = TcpStream::connect(&addr).await?;
    tracing::debug!(%addr, "TCP connection established");
    Ok(SmtpStream::Tcp(stream))
}

/// Connects to an SMTP server over TLS (implicit TLS on port 465).
///
/// Certificates in `cert_file` (PEM) are trusted in addition to the bundled
/// web PKI roots.
///
/// # Errors
///
/// Returns an error if the certificate file cannot be loaded, or if the
/// connection or TLS handshake fails.
pub async fn connect_tls(hostname: &str, port: u16, cert_file: Option<&Path>) -> Result<SmtpStream> {
    let extra_roots = match cert_file {
        Some(path) => load_certificates(path).await?,
        None => Vec::new(),
    };
    let connector = create_tls_connector(extra_roots)?;
    let server_name = ServerName::try_from(hostname.to_string())?;

    let addr = format!("{hostname}:{port}");
    let tcp_stream = TcpStream::connect(&addr).await?;
    let tls_stream = connector.connect(server_name, tcp_stream).await?;
    tracing::debug!(%addr, "TLS connection established");

    Ok(SmtpStream::Tls(Box::new(tls_stream)))
}

/// Creates a TLS connector trusting the web PKI roots plus `extra_roots`.
///
/// # Errors
///
/// Returns an error if one of the extra certificates is rejected.
pub fn create_tls_connector(extra_roots: Vec<CertificateDer<'static>>) -> Result<TlsConnector> {
    let mut root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };
    for cert in extra_roots {
        root_store.add(cert)?;
    }

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Ok(TlsConnector::from(Arc::new(config)))
}

/// Reads all PEM certificates from a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or holds no certificate.
pub async fn load_certificates(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let certificate_error = |reason: String| Error::Certificate {
        path: path.to_path_buf(),
        reason,
    };

    let pem = tokio::fs::read(path)
        .await
        .map_err(|e| certificate_error(e.to_string()))?;

    let certs = rustls_pemfile::certs(&mut pem.as_slice())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| certificate_error(e.to_string()))?;

    if certs.is_empty() {
        return Err(certificate_error("no certificates found".to_string()));
    }

    Ok(certs)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tls_connector_with_default_roots() {
        assert!(create_tls_connector(Vec::new()).is_ok());
    }

    #[tokio::test]
    async fn test_load_certificates_missing_file() {
        let err = load_certificates(Path::new("/nonexistent/mailpost-ca.pem"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Certificate { .. }));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_load_certificates_without_pem_blocks() {
        let path = std::env::temp_dir().join(format!("mailpost-empty-{}.pem", std::process::id()));
        tokio::fs::write(&path, b"not a certificate\n").await.unwrap();

        let result = load_certificates(&path).await;
        tokio::fs::remove_file(&path).await.unwrap();

        assert!(matches!(result, Err(Error::Certificate { .. })));
    }

    #[tokio::test]
    async fn test_connect_tls_rejects_missing_certificate() {
        let result = connect_tls("localhost", 465, Some(Path::new("/nonexistent/ca.pem"))).await;
        assert!(matches!(result, Err(Error::Certificate { .. })));
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Bind then drop to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = connect("127.0.0.1", port).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
