//! Core type definitions using newtype patterns for type safety.
//!
//! A `ScanTarget` can only be obtained through validation, so the engine
//! never sees an unresolved host or a malformed port range.

mod port;
mod target;

pub use port::{Port, PortError, PortRange};
pub use target::{resolve_host, ScanTarget, TargetError};
