//! Application settings and paths.
//!
//! Settings live in `<XDG config dir>/portsweep/settings.json`. Every field
//! is optional in the file; missing fields take the built-in defaults.

use crate::cli::OutputFormat;
use crate::config::ScanConfig;
use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application directory paths following the XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/portsweep)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Locate the configuration directory. Nothing is created on disk.
    pub fn discover() -> ConfigResult<Self> {
        let project = ProjectDirs::from("com", "portsweep", "portsweep")
            .ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Defaults applied beneath the command-line flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Connect timeout in seconds.
    pub timeout_secs: u64,
    /// Enable TLS dialing of TLS ports.
    pub use_tls: bool,
    /// Banner length cap in bytes.
    pub max_banner_length: usize,
    /// Maximum probes in flight.
    pub concurrency: usize,
    /// Default output format.
    pub output_format: OutputFormat,
}

impl Default for AppSettings {
    fn default() -> Self {
        let scan = ScanConfig::default();
        Self {
            timeout_secs: scan.timeout.as_secs(),
            use_tls: scan.use_tls,
            max_banner_length: scan.max_banner_length,
            concurrency: scan.concurrency,
            output_format: OutputFormat::default(),
        }
    }
}

impl AppSettings {
    /// Load settings from the default location.
    ///
    /// A missing file is not an error and yields the defaults.
    pub fn load() -> ConfigResult<Self> {
        let file = Paths::discover()?.settings_file();

        if !file.exists() {
            tracing::debug!(path = %file.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let settings = serde_json::from_str(&content)?;
        tracing::debug!(path = %path.display(), ?settings, "loaded settings");
        Ok(settings)
    }

    /// Scan configuration derived from these settings alone.
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig::new()
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_tls(self.use_tls)
            .with_max_banner_length(self.max_banner_length)
            .with_concurrency(self.concurrency)
    }
}
