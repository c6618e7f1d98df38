//! Error types for portsweep.
//!
//! Uses `thiserror` for ergonomic error definitions.

use crate::types::{PortError, TargetError};
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for scanning operations.
///
/// Only `InvalidTarget`, `InvalidPortRange`, `InvalidConfig` and
/// `Interrupted` ever leave the engine. The connection variants describe
/// why a single dial failed and stay inside the probe that produced them.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("invalid target: {0}")]
    InvalidTarget(#[from] TargetError),

    #[error("invalid port range: {0}")]
    InvalidPortRange(#[from] PortError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("scan interrupted by user")]
    Interrupted,

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("connection timed out")]
    Timeout,

    #[error("connection refused")]
    ConnectionRefused,

    #[error("host unreachable")]
    HostUnreachable,

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("scan task failed: {0}")]
    TaskFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors raised while loading settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine the configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid settings file: {0}")]
    InvalidFormat(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidFormat(err.to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level error for the command-line front end.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("please specify a target IP address or hostname with --target or -t")]
    MissingTarget,

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to write report: {0}")]
    Output(#[from] anyhow::Error),
}

impl CliError {
    /// Process exit status for this error: 2 for a user interrupt, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Scan(ScanError::Interrupted) => 2,
            _ => 1,
        }
    }

    pub fn is_interrupt(&self) -> bool {
        matches!(self, Self::Scan(ScanError::Interrupted))
    }
}

pub type CliResult<T> = Result<T, CliError>;
