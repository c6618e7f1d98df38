//! Per-scan configuration.

use crate::error::{ScanError, ScanResult};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Upper bound on the banner buffer allocated per open port.
pub const MAX_BANNER_LIMIT: usize = 1024 * 1024;

/// Configuration for a scan operation. Fixed once the engine starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Connect timeout per port (TCP dial, plus the TLS handshake when used).
    pub timeout: Duration,
    /// Dial conventional TLS ports with a TLS handshake.
    pub use_tls: bool,
    /// Maximum number of banner bytes read from a service.
    pub max_banner_length: usize,
    /// Maximum number of probes in flight at once.
    pub concurrency: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(1),
            use_tls: false,
            max_banner_length: 1024,
            concurrency: 100,
        }
    }
}

impl ScanConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connect timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable or disable TLS dialing of TLS ports.
    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    /// Set the banner length cap.
    pub fn with_max_banner_length(mut self, max_banner_length: usize) -> Self {
        self.max_banner_length = max_banner_length;
        self
    }

    /// Set the concurrency limit.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Deadline for the banner read: half the connect timeout, so a single
    /// port never costs more than 1.5x the timeout.
    pub fn banner_timeout(&self) -> Duration {
        self.timeout / 2
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> ScanResult<()> {
        if self.timeout.is_zero() {
            return Err(ScanError::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        if self.concurrency == 0 || self.concurrency > Semaphore::MAX_PERMITS {
            return Err(ScanError::InvalidConfig(format!(
                "concurrency must be between 1 and {}, got {}",
                Semaphore::MAX_PERMITS,
                self.concurrency
            )));
        }
        if self.max_banner_length == 0 || self.max_banner_length > MAX_BANNER_LIMIT {
            return Err(ScanError::InvalidConfig(format!(
                "max banner length must be between 1 and {}, got {}",
                MAX_BANNER_LIMIT, self.max_banner_length
            )));
        }
        Ok(())
    }
}
