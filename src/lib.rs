//! # portsweep - A Concurrent TCP Port Scanner
//!
//! portsweep probes a contiguous range of TCP ports on one host, reports
//! each open port with its conventional service name and a sanitized banner,
//! and finishes with scan statistics.
//!
//! ## Features
//!
//! - **Bounded Concurrency**: A fixed number of probes in flight, never more
//! - **Banner Grabbing**: Protocol triggers for HTTP, SMTP, POP3 and IMAP
//! - **Optional TLS**: Handshake on conventional TLS ports, certificates unchecked
//! - **Clean Interrupts**: Ctrl-C abandons in-flight probes and exits promptly
//! - **Multiple Output Formats**: Live plain text, JSON and CSV
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use portsweep::config::ScanConfig;
//! use portsweep::output::SilentObserver;
//! use portsweep::scanner::ScanEngine;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ScanConfig::new().with_concurrency(50);
//!     let mut engine = ScanEngine::new("192.168.1.1", 1, 1024, config);
//!
//!     let report = engine.run(Arc::new(SilentObserver)).await.unwrap();
//!     for result in &report.results {
//!         println!("{result}");
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Validated ports, port ranges and scan targets
//! - [`services`] - Well-known port to service name table
//! - [`banner`] - Protocol triggers, banner reads and sanitization
//! - [`scanner`] - Probes, the admission gate and the scan engine
//! - [`config`] - Scan configuration and the settings file
//! - [`output`] - Live console reporting, JSON and CSV
//! - [`error`] - Error types

pub mod banner;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod scanner;
pub mod services;
pub mod types;

// Re-export commonly used types
pub use config::ScanConfig;
pub use error::{CliError, ScanError};
pub use scanner::{PortProbe, PortResult, ScanEngine, ScanReport, ScanState};
pub use types::{Port, PortRange, ScanTarget};
