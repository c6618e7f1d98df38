//! TLS dialing for conventional TLS ports.
//!
//! Certificate and hostname verification are disabled. Targets
//! routinely present self-signed or mismatched certificates; a scan only
//! needs to reach the service.

use crate::error::{ScanError, ScanResult};
use tokio::net::TcpStream;
use tokio_native_tls::{TlsConnector, TlsStream};

/// Ports that conventionally speak TLS from the first byte.
pub const TLS_PORTS: [u16; 6] = [443, 465, 636, 993, 995, 8443];

/// Check if a port is in the conventional TLS set.
pub fn is_tls_port(port: u16) -> bool {
    TLS_PORTS.contains(&port)
}

/// Performs TLS handshakes without verifying the peer.
#[derive(Clone)]
pub struct InsecureTlsDialer {
    connector: TlsConnector,
}

impl InsecureTlsDialer {
    pub fn new() -> ScanResult<Self> {
        let connector = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
            .build()
            .map_err(|e| ScanError::Tls(e.to_string()))?;

        Ok(Self {
            connector: TlsConnector::from(connector),
        })
    }

    /// Run the client handshake over an established TCP stream.
    pub async fn handshake(
        &self,
        domain: &str,
        stream: TcpStream,
    ) -> ScanResult<TlsStream<TcpStream>> {
        self.connector
            .connect(domain, stream)
            .await
            .map_err(|e| ScanError::Tls(e.to_string()))
    }
}

impl std::fmt::Debug for InsecureTlsDialer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsecureTlsDialer").finish_non_exhaustive()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[test]
    fn test_tls_ports() {
        for port in [443, 465, 636, 993, 995, 8443] {
            assert!(is_tls_port(port));
        }
        assert!(!is_tls_port(80));
        assert!(!is_tls_port(22));
    }

    #[test]
    fn test_dialer_builds() {
        assert!(InsecureTlsDialer::new().is_ok());
    }

    #[tokio::test]
    async fn test_handshake_accepts_self_signed_certificate() {
        let port = test_server::spawn_greeter(b"220 secure ready\r\n").await;
        let socket = TcpStream::connect(("127.0.0.1", port)).await.unwrap();

        let dialer = InsecureTlsDialer::new().unwrap();
        let mut stream = dialer.handshake("localhost", socket).await.unwrap();

        let mut buf = [0u8; 64];
        let n = stream.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"220 secure ready\r\n");
    }

    #[tokio::test]
    async fn test_handshake_ignores_hostname_mismatch() {
        let port = test_server::spawn_greeter(b"hello").await;
        let socket = TcpStream::connect(("127.0.0.1", port)).await.unwrap();

        let dialer = InsecureTlsDialer::new().unwrap();
        assert!(dialer.handshake("mail.example.org", socket).await.is_ok());
    }
}
