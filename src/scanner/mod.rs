//! Scanner module - coordinates concurrent port probing.
//!
//! [`ScanEngine`] fans out one [`PortProbe`] per port through a bounded
//! [`AdmissionGate`], streams open ports to a consumer as they arrive and
//! aggregates everything into a [`ScanReport`].

pub mod engine;
pub mod gate;
pub mod stats;
pub mod tcp;
pub mod tls;
pub mod traits;

use crate::config::ScanConfig;
use crate::types::ScanTarget;
use chrono::{DateTime, Local};
use serde::Serialize;

pub use engine::{ScanEngine, ScanState};
pub use gate::{AdmissionGate, GatePermit};
pub use stats::{Progress, ScanStats};
pub use tcp::TcpProbe;
pub use tls::{is_tls_port, InsecureTlsDialer};
pub use traits::{PortProbe, PortResult};

/// Complete scan results.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub target: String,
    pub ip_address: String,
    pub start_port: u16,
    pub end_port: u16,
    pub use_tls: bool,
    pub concurrency: usize,
    pub ports_scanned: usize,
    pub open_ports: usize,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub duration_ms: u64,
    /// Open ports, sorted by port number.
    pub results: Vec<PortResult>,
}

impl ScanReport {
    fn new(
        target: &ScanTarget,
        config: &ScanConfig,
        stats: &ScanStats,
        mut results: Vec<PortResult>,
    ) -> Self {
        results.sort_by_key(|r| r.port);
        let finished_at = stats.mark_finished();

        Self {
            target: target.original.clone(),
            ip_address: target.ip.to_string(),
            start_port: target.range.start().as_u16(),
            end_port: target.range.end().as_u16(),
            use_tls: config.use_tls,
            concurrency: config.concurrency,
            ports_scanned: stats.scanned(),
            open_ports: stats.open_ports(),
            started_at: stats.started_at(),
            finished_at,
            duration_ms: stats.elapsed().as_millis() as u64,
            results,
        }
    }

    /// Elapsed time in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.duration_ms as f64 / 1000.0
    }
}
