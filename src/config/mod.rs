//! Configuration management for portsweep.
//!
//! `ScanConfig` is the immutable per-scan configuration handed to the
//! engine. `AppSettings` is the optional settings file that supplies
//! defaults beneath the command-line flags.

mod scan;
mod settings;

pub use scan::ScanConfig;
pub use settings::{AppSettings, Paths};
