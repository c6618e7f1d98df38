//! TCP connect probe.
//!
//! Completes a full TCP handshake (optionally followed by a TLS handshake)
//! using the operating system's socket API. No elevated privileges are
//! required. A failed dial is the normal "closed or filtered" outcome and
//! produces no result.

use crate::banner::probe_banner;
use crate::config::ScanConfig;
use crate::error::{ScanError, ScanResult};
use crate::scanner::tls::{is_tls_port, InsecureTlsDialer};
use crate::scanner::traits::{PortProbe, PortResult};
use crate::scanner::ScanStats;
use crate::services::classify;
use crate::types::{Port, ScanTarget};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Probe that dials plain TCP, or TLS for TLS ports when enabled.
#[derive(Debug)]
pub struct TcpProbe {
    target: ScanTarget,
    config: ScanConfig,
    tls: Option<InsecureTlsDialer>,
}

impl TcpProbe {
    /// Create a probe for `target`.
    ///
    /// The TLS connector is only built when `config.use_tls` is set.
    pub fn new(target: ScanTarget, config: ScanConfig) -> ScanResult<Self> {
        let tls = if config.use_tls {
            Some(InsecureTlsDialer::new()?)
        } else {
            None
        };

        Ok(Self {
            target,
            config,
            tls,
        })
    }

    /// Attempt a plain TCP connection within the connect timeout.
    async fn attempt_connect(&self, addr: SocketAddr) -> ScanResult<TcpStream> {
        match timeout(self.config.timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) if e.kind() == ErrorKind::ConnectionRefused => {
                Err(ScanError::ConnectionRefused)
            }
            Ok(Err(e)) if e.to_string().to_lowercase().contains("unreachable") => {
                Err(ScanError::HostUnreachable)
            }
            Ok(Err(e)) => Err(ScanError::ConnectionFailed(e.to_string())),
            Err(_) => Err(ScanError::Timeout),
        }
    }

    /// TCP connect plus TLS handshake, together bounded by the connect timeout.
    async fn attempt_tls_connect(
        &self,
        dialer: &InsecureTlsDialer,
        addr: SocketAddr,
    ) -> ScanResult<tokio_native_tls::TlsStream<TcpStream>> {
        let dial = async {
            let stream = TcpStream::connect(addr).await?;
            dialer.handshake(&self.target.original, stream).await
        };

        match timeout(self.config.timeout, dial).await {
            Ok(result) => result,
            Err(_) => Err(ScanError::Timeout),
        }
    }

    /// Record the open port, classify it and grab its banner.
    async fn inspect<S>(&self, stream: &mut S, port: Port, stats: &ScanStats) -> PortResult
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        stats.record_open();

        let port_num = port.as_u16();
        let service = classify(port_num);
        let banner = probe_banner(stream, port_num, &self.target.original, &self.config).await;

        PortResult::new(port, service, banner)
    }
}

#[async_trait]
impl PortProbe for TcpProbe {
    async fn probe(&self, port: Port, stats: &ScanStats) -> Option<PortResult> {
        let addr = SocketAddr::new(self.target.ip, port.as_u16());

        // Streams are dropped, and therefore closed, before returning.
        let dialed = match self.tls.as_ref().filter(|_| is_tls_port(port.as_u16())) {
            Some(dialer) => match self.attempt_tls_connect(dialer, addr).await {
                Ok(mut stream) => Ok(self.inspect(&mut stream, port, stats).await),
                Err(e) => Err(e),
            },
            None => match self.attempt_connect(addr).await {
                Ok(mut stream) => Ok(self.inspect(&mut stream, port, stats).await),
                Err(e) => Err(e),
            },
        };

        match dialed {
            Ok(result) => {
                tracing::debug!(%addr, service = %result.service, "port open");
                Some(result)
            }
            Err(e) => {
                tracing::trace!(%addr, error = %e, "dial failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::banner::NO_BANNER;
    use crate::scanner::tls::test_server;
    use crate::types::PortRange;
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    fn loopback_target(port: u16) -> ScanTarget {
        let range = PortRange::new(u32::from(port), u32::from(port)).unwrap();
        ScanTarget::from_ip(IpAddr::V4(Ipv4Addr::LOCALHOST), range)
    }

    fn fast_config() -> ScanConfig {
        ScanConfig::new().with_timeout(Duration::from_millis(500))
    }

    #[tokio::test]
    async fn test_closed_port_yields_nothing() {
        // Bind then release a port so nothing listens on it.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let probe = TcpProbe::new(loopback_target(port), fast_config()).unwrap();
        let stats = ScanStats::new(1);
        let result = probe.probe(Port::new(port).unwrap(), &stats).await;

        assert!(result.is_none());
        assert_eq!(stats.open_ports(), 0);
    }

    #[tokio::test]
    async fn test_open_port_with_greeting() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"220 ftp.example.com ready\r\n").await.unwrap();
            tokio::time::sleep(Duration::from_millis(200)).await;
        });

        let probe = TcpProbe::new(loopback_target(port), fast_config()).unwrap();
        let stats = ScanStats::new(1);
        let result = probe.probe(Port::new(port).unwrap(), &stats).await.unwrap();

        assert_eq!(result.port.as_u16(), port);
        assert_eq!(result.banner, "220 ftp.example.com ready");
        assert_eq!(result.service, classify(port));
        assert_eq!(stats.open_ports(), 1);
    }

    #[tokio::test]
    async fn test_open_port_that_closes_immediately() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            drop(socket);
        });

        let probe = TcpProbe::new(loopback_target(port), fast_config()).unwrap();
        let stats = ScanStats::new(1);
        let result = probe.probe(Port::new(port).unwrap(), &stats).await.unwrap();

        assert_eq!(result.banner, NO_BANNER);
        assert_eq!(stats.open_ports(), 1);
    }

    #[tokio::test]
    async fn test_plain_dial_when_tls_disabled() {
        let probe = TcpProbe::new(loopback_target(443), fast_config()).unwrap();
        assert!(probe.tls.is_none());

        let probe = TcpProbe::new(loopback_target(443), fast_config().with_tls(true)).unwrap();
        assert!(probe.tls.is_some());
    }

    #[tokio::test]
    async fn test_tls_dial_reads_banner_through_tls() {
        let port = test_server::spawn_greeter(b"* OK IMAPS ready\r\n").await;
        let probe = TcpProbe::new(loopback_target(port), fast_config().with_tls(true)).unwrap();
        let dialer = probe.tls.as_ref().unwrap();
        let addr = SocketAddr::new(probe.target.ip, port);

        let mut stream = probe.attempt_tls_connect(dialer, addr).await.unwrap();
        let stats = ScanStats::new(1);
        let result = probe.inspect(&mut stream, Port::new(port).unwrap(), &stats).await;

        assert_eq!(result.banner, "* OK IMAPS ready");
        assert_eq!(stats.open_ports(), 1);
    }

    #[tokio::test]
    async fn test_tls_dial_to_plain_listener_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            drop(socket);
        });

        let probe = TcpProbe::new(loopback_target(port), fast_config().with_tls(true)).unwrap();
        let dialer = probe.tls.as_ref().unwrap();
        let addr = SocketAddr::new(probe.target.ip, port);

        assert!(probe.attempt_tls_connect(dialer, addr).await.is_err());
    }
}
