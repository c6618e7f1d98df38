//! Command-line interface definitions for portsweep.
//!
//! Uses `clap` derive macros for declarative argument parsing. Flags left
//! unset fall back to the settings file, then to built-in defaults.

use crate::config::{AppSettings, ScanConfig};
use crate::error::{CliError, CliResult};
use crate::output::{self, ConsoleReporter, ScanObserver, SilentObserver};
use crate::scanner::ScanEngine;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// A concurrent TCP port scanner with service classification and banner grabbing.
#[derive(Parser, Debug)]
#[command(name = "portsweep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Scan a host's TCP ports, classify services and grab banners", long_about = None)]
#[command(after_help = "Long options take two dashes: --target, --timeout, --ssl.")]
pub struct Cli {
    /// Target IP address or hostname to scan
    #[arg(short = 't', long, default_value = "")]
    pub target: String,

    /// First port to scan, inclusive
    #[arg(short = 's', long = "start", default_value_t = 1)]
    pub start_port: u32,

    /// Last port to scan, inclusive
    #[arg(short = 'e', long = "end", default_value_t = 1024)]
    pub end_port: u32,

    /// Connect timeout per port, in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Dial conventional TLS ports (443, 465, 636, 993, 995, 8443) with TLS.
    /// Certificates are not verified.
    #[arg(long, overrides_with = "no_ssl")]
    pub ssl: bool,

    /// Dial every port in plain TCP, even if the settings file enables TLS
    #[arg(long = "no-ssl", overrides_with = "ssl")]
    pub no_ssl: bool,

    /// Maximum banner length in bytes
    #[arg(long = "max-banner-length", alias = "maxBannerLength", value_name = "BYTES")]
    pub max_banner_length: Option<usize>,

    /// Maximum number of simultaneous probes
    #[arg(short = 'c', long)]
    pub concurrency: Option<usize>,

    /// Output format for results
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Path to a settings file (default: the XDG config directory)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbose logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text, printed live
    #[default]
    Plain,
    /// JSON report at the end of the scan
    Json,
    /// CSV of open ports at the end of the scan
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

impl Cli {
    /// Merge flags over settings.
    pub fn scan_config(&self, settings: &AppSettings) -> ScanConfig {
        let base = settings.scan_config();
        ScanConfig {
            timeout: self.timeout.map(Duration::from_secs).unwrap_or(base.timeout),
            use_tls: self.tls_override().unwrap_or(base.use_tls),
            max_banner_length: self.max_banner_length.unwrap_or(base.max_banner_length),
            concurrency: self.concurrency.unwrap_or(base.concurrency),
        }
    }

    /// `Some` only when `--ssl` or `--no-ssl` was given; the last one wins.
    fn tls_override(&self) -> Option<bool> {
        match (self.ssl, self.no_ssl) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    pub fn output_format(&self, settings: &AppSettings) -> OutputFormat {
        self.output.unwrap_or(settings.output_format)
    }

    /// Load the settings file this invocation points at.
    ///
    /// An explicit `--config` must be readable; a broken default file only
    /// produces a warning.
    pub fn settings(&self) -> CliResult<AppSettings> {
        match &self.config {
            Some(path) => Ok(AppSettings::load_from(path)?),
            None => Ok(AppSettings::load().unwrap_or_else(|e| {
                output::print_warning(&format!("ignoring settings file: {e}"));
                AppSettings::default()
            })),
        }
    }
}

const LONG_FLAGS: [&str; 12] = [
    "target",
    "start",
    "end",
    "timeout",
    "ssl",
    "no-ssl",
    "max-banner-length",
    "maxBannerLength",
    "concurrency",
    "output",
    "config",
    "verbose",
];

/// Detect a long option written with a single dash, as in `-target host`.
///
/// clap would split it into a short flag and a value and fail with an
/// unrelated message, so callers check for it first.
pub fn single_dash_hint<I, S>(args: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter().skip(1).find_map(|arg| {
        let name = arg.as_ref().strip_prefix('-')?;
        if name.starts_with('-') {
            return None;
        }
        let name = name.split('=').next().unwrap_or(name);
        LONG_FLAGS.contains(&name).then(|| {
            format!("'-{name}' is not an option; long options take two dashes: '--{name}'")
        })
    })
}

/// Execute a scan as described by the command line.
pub async fn run(cli: Cli) -> CliResult<()> {
    if cli.target.trim().is_empty() {
        return Err(CliError::MissingTarget);
    }

    let settings = cli.settings()?;
    let config = cli.scan_config(&settings);
    let format = cli.output_format(&settings);
    tracing::debug!(?config, %format, "resolved configuration");

    let observer: Arc<dyn ScanObserver> = match format {
        OutputFormat::Plain => Arc::new(ConsoleReporter::new()),
        OutputFormat::Json | OutputFormat::Csv => Arc::new(SilentObserver),
    };

    let mut engine = ScanEngine::new(cli.target.as_str(), cli.start_port, cli.end_port, config);
    let report = engine.run(observer).await?;

    output::write_report(&report, format)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["portsweep", "-t", "example.com"]).unwrap();
        assert_eq!(cli.target, "example.com");
        assert_eq!(cli.start_port, 1);
        assert_eq!(cli.end_port, 1024);
        assert!(!cli.ssl);

        let config = cli.scan_config(&AppSettings::default());
        assert_eq!(config, ScanConfig::default());
        assert_eq!(cli.output_format(&AppSettings::default()), OutputFormat::Plain);
    }

    #[test]
    fn test_all_flags() {
        let cli = Cli::try_parse_from([
            "portsweep",
            "--target",
            "10.0.0.1",
            "--start",
            "20",
            "--end",
            "25",
            "--timeout",
            "3",
            "--ssl",
            "--maxBannerLength",
            "256",
            "--concurrency",
            "8",
            "--output",
            "json",
        ])
        .unwrap();

        let config = cli.scan_config(&AppSettings::default());
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert!(config.use_tls);
        assert_eq!(config.max_banner_length, 256);
        assert_eq!(config.concurrency, 8);
        assert_eq!(cli.output_format(&AppSettings::default()), OutputFormat::Json);
        assert_eq!((cli.start_port, cli.end_port), (20, 25));
    }

    #[test]
    fn test_out_of_range_ports_reach_validation() {
        // Out-of-range values parse so validation can report them.
        let cli = Cli::try_parse_from(["portsweep", "-t", "h", "-s", "0", "-e", "65536"]).unwrap();
        assert_eq!((cli.start_port, cli.end_port), (0, 65536));
    }

    #[test]
    fn test_flags_override_settings() {
        let settings = AppSettings {
            timeout_secs: 5,
            concurrency: 50,
            use_tls: true,
            ..AppSettings::default()
        };

        let cli = Cli::try_parse_from(["portsweep", "-t", "h", "-c", "7"]).unwrap();
        let config = cli.scan_config(&settings);
        assert_eq!(config.concurrency, 7);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(config.use_tls);
    }

    #[test]
    fn test_no_ssl_overrides_settings() {
        let settings = AppSettings {
            use_tls: true,
            ..AppSettings::default()
        };

        let cli = Cli::try_parse_from(["portsweep", "-t", "h", "--no-ssl"]).unwrap();
        assert!(!cli.scan_config(&settings).use_tls);

        let cli = Cli::try_parse_from(["portsweep", "-t", "h"]).unwrap();
        assert!(cli.scan_config(&settings).use_tls);

        let cli = Cli::try_parse_from(["portsweep", "-t", "h", "--no-ssl", "--ssl"]).unwrap();
        assert!(cli.scan_config(&AppSettings::default()).use_tls);

        let cli = Cli::try_parse_from(["portsweep", "-t", "h", "--ssl", "--no-ssl"]).unwrap();
        assert!(!cli.scan_config(&settings).use_tls);
    }

    #[test]
    fn test_single_dash_long_flags_are_flagged() {
        let hint = single_dash_hint(["portsweep", "-target", "10.0.0.1"]).unwrap();
        assert!(hint.contains("'--target'"));

        let hint = single_dash_hint(["portsweep", "-t", "h", "-timeout=3"]).unwrap();
        assert!(hint.contains("'--timeout'"));

        assert!(single_dash_hint(["portsweep", "-maxBannerLength", "64"]).is_some());
        assert!(single_dash_hint(["portsweep", "-t", "h", "--ssl", "-s", "1"]).is_none());
        assert!(single_dash_hint(["portsweep", "-verbose"]).is_some());
    }

    #[test]
    fn test_help_mentions_double_dash() {
        use clap::CommandFactory;
        let help = Cli::command().render_help().to_string();
        assert!(help.contains("Long options take two dashes"));
        assert!(help.contains("--no-ssl"));
    }

    #[tokio::test]
    async fn test_missing_target() {
        let cli = Cli::try_parse_from(["portsweep"]).unwrap();
        let err = run(cli).await.unwrap_err();
        assert!(matches!(err, CliError::MissingTarget));
        assert_eq!(err.exit_code(), 1);
    }
}
