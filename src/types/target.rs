//! Target validation and hostname resolution.
//!
//! A target is either an IP literal (accepted without any lookup) or a
//! hostname that must resolve to at least one address. Validation always
//! finishes before the first probe is dispatched.

use crate::error::ScanError;
use crate::types::PortRange;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// A validated scan target: host, resolved address and port range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanTarget {
    /// The original input (hostname or IP string).
    pub original: String,
    /// The resolved IP address.
    pub ip: IpAddr,
    /// Ports to probe, inclusive.
    pub range: PortRange,
}

impl ScanTarget {
    /// Validate the port range and the host, in that order.
    ///
    /// The range check is pure, so a bad range never costs a DNS query.
    pub async fn validate(target: &str, start: u32, end: u32) -> Result<Self, ScanError> {
        let range = PortRange::new(start, end)?;
        let original = target.trim();
        let ip = resolve_host(original).await?;

        Ok(Self {
            original: original.to_string(),
            ip,
            range,
        })
    }

    /// Build a target from an already known address. No lookup is made.
    pub fn from_ip(ip: IpAddr, range: PortRange) -> Self {
        Self {
            original: ip.to_string(),
            ip,
            range,
        }
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.original == self.ip.to_string() {
            write!(f, "{}", self.ip)
        } else {
            write!(f, "{} ({})", self.original, self.ip)
        }
    }
}

/// Error type for target parsing and resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("no target given")]
    Empty,
    #[error("'{0}' is neither an IP address nor a valid hostname")]
    InvalidFormat(String),
    #[error("failed to resolve hostname '{0}': {1}")]
    DnsResolutionFailed(String, String),
    #[error("no IP addresses found for hostname '{0}'")]
    NoAddressesFound(String),
}

/// Resolve a hostname or IP address string to a single address.
///
/// IP literals short-circuit. Hostnames go through the system resolver
/// configuration (which honours the hosts file), falling back to the
/// built-in upstream servers if the system configuration is unreadable.
pub async fn resolve_host(target: &str) -> Result<IpAddr, TargetError> {
    let target = target.trim();
    if target.is_empty() {
        return Err(TargetError::Empty);
    }

    if let Ok(ip) = target.parse::<IpAddr>() {
        return Ok(ip);
    }

    if !is_plausible_hostname(target) {
        return Err(TargetError::InvalidFormat(target.to_string()));
    }

    let resolver = TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|err| {
        tracing::debug!(%err, "system resolver configuration unavailable, using defaults");
        TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
    });

    let response = resolver
        .lookup_ip(target)
        .await
        .map_err(|e| TargetError::DnsResolutionFailed(target.to_string(), e.to_string()))?;

    let ip = response
        .iter()
        .next()
        .ok_or_else(|| TargetError::NoAddressesFound(target.to_string()))?;

    tracing::debug!(host = target, %ip, "resolved target");
    Ok(ip)
}

/// Cheap sanity check before a lookup: one token, no control characters.
///
/// Label syntax is left to the resolver: container DNS serves names like
/// `my_service`.
fn is_plausible_hostname(s: &str) -> bool {
    !s.is_empty() && s.len() <= 253 && !s.chars().any(|c| c.is_whitespace() || c.is_control())
}
