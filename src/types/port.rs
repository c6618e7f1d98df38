//! Port types with validation.
//!
//! The `Port` newtype ensures values are always valid port numbers (1-65535).
//! `PortRange` is built from raw integers so out-of-range input such as
//! `0` or `65536` is rejected rather than silently wrapped.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated network port number (1-65535).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Port(u16);

impl Port {
    /// Minimum valid port number.
    pub const MIN: u16 = 1;
    /// Maximum valid port number.
    pub const MAX: u16 = 65535;

    /// Create a new Port from a u16, returning None if invalid.
    #[inline]
    pub const fn new(port: u16) -> Option<Self> {
        if port >= Self::MIN {
            Some(Self(port))
        } else {
            None
        }
    }

    /// Get the raw port number.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

/// Error type for port range validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("start port {0} is out of valid range (1-65535)")]
    StartOutOfRange(u32),
    #[error("end port {0} is out of valid range (1-65535)")]
    EndOutOfRange(u32),
    #[error("start port ({start}) is greater than end port ({end})")]
    Inverted { start: u32, end: u32 },
}

/// An inclusive range of ports, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    start: Port,
    end: Port,
}

impl PortRange {
    /// Validate raw bounds and build a range.
    pub fn new(start: u32, end: u32) -> Result<Self, PortError> {
        let max = u32::from(Port::MAX);
        if start < u32::from(Port::MIN) || start > max {
            return Err(PortError::StartOutOfRange(start));
        }
        if end < u32::from(Port::MIN) || end > max {
            return Err(PortError::EndOutOfRange(end));
        }
        if start > end {
            return Err(PortError::Inverted { start, end });
        }
        // Both bounds were checked against 1..=65535 above.
        Ok(Self {
            start: Port(start as u16),
            end: Port(end as u16),
        })
    }

    pub const fn start(&self) -> Port {
        self.start
    }

    pub const fn end(&self) -> Port {
        self.end
    }

    /// Get the number of ports in this range.
    pub const fn len(&self) -> usize {
        (self.end.0 - self.start.0) as usize + 1
    }

    /// A valid range always holds at least one port.
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over all ports in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = Port> {
        (self.start.0..=self.end.0).map(Port)
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_validation() {
        assert!(Port::new(0).is_none());
        assert!(Port::new(1).is_some());
        assert!(Port::new(80).is_some());
        assert!(Port::new(65535).is_some());
    }

    #[test]
    fn test_port_range() {
        let range = PortRange::new(1, 100).unwrap();
        assert_eq!(range.len(), 100);
        assert_eq!(range.iter().count(), 100);
        assert_eq!(range.iter().next(), Port::new(1));
        assert_eq!(range.iter().last(), Port::new(100));
    }

    #[test]
    fn test_full_range() {
        let range = PortRange::new(1, 65535).unwrap();
        assert_eq!(range.len(), 65535);
        assert_eq!(range.iter().last(), Port::new(65535));
    }

    #[test]
    fn test_single_port_range() {
        let range = PortRange::new(443, 443).unwrap();
        assert_eq!(range.len(), 1);
        assert_eq!(range.to_string(), "443 - 443");
    }

    #[test]
    fn test_range_rejections_are_distinct() {
        assert_eq!(PortRange::new(0, 10), Err(PortError::StartOutOfRange(0)));
        assert_eq!(PortRange::new(1, 65536), Err(PortError::EndOutOfRange(65536)));
        assert_eq!(
            PortRange::new(500, 100),
            Err(PortError::Inverted { start: 500, end: 100 })
        );
    }
}
