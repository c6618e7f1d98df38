//! Probe trait abstraction.
//!
//! The engine only knows how to admit, run and count probes; what a probe
//! does with its port lives behind [`PortProbe`]. `TcpProbe` is the real
//! implementation, tests substitute instrumented ones.

use crate::scanner::ScanStats;
use crate::types::Port;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An open port found by a probe.
///
/// Closed and filtered ports never produce a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortResult {
    /// The port that accepted a connection.
    pub port: Port,
    /// Conventional service name, or "unknown".
    pub service: String,
    /// Sanitized banner, or "no banner".
    pub banner: String,
}

impl PortResult {
    /// Create a new port result.
    pub fn new(port: Port, service: impl Into<String>, banner: impl Into<String>) -> Self {
        Self {
            port,
            service: service.into(),
            banner: banner.into(),
        }
    }
}

impl fmt::Display for PortResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Port {}: Open ({}) - {}", self.port, self.service, self.banner)
    }
}

/// Trait for single-port probe implementations.
///
/// A probe must not fail: connection problems mean "no result". On a
/// successful connection it records the open port in `stats` before
/// returning its result.
///
/// # Example
///
/// ```ignore
/// use portsweep::scanner::{PortProbe, ScanStats};
///
/// async fn check<P: PortProbe>(probe: &P, port: Port, stats: &ScanStats) -> bool {
///     probe.probe(port, stats).await.is_some()
/// }
/// ```
#[async_trait]
pub trait PortProbe: Send + Sync {
    /// Probe one port, returning a result only if it is open.
    async fn probe(&self, port: Port, stats: &ScanStats) -> Option<PortResult>;
}
