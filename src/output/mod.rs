//! Output formatting module.
//!
//! Live console output goes through the [`ScanObserver`] callbacks while the
//! scan runs. JSON and CSV are written once from the final [`ScanReport`].

mod csv_format;
mod json_format;
mod plain;

pub use csv_format::{print_csv, write_csv};
pub use json_format::{print_json, write_json};
pub use plain::{print_error, print_warning, ConsoleReporter};

use crate::cli::OutputFormat;
use crate::config::ScanConfig;
use crate::scanner::{PortResult, Progress, ScanReport};
use crate::types::ScanTarget;
use chrono::{DateTime, Local};

/// Receives scan events as they happen.
///
/// `on_result` is called from the single result consumer, `on_progress` from
/// whichever probe task crossed a reporting step, so implementations must
/// tolerate the two interleaving.
pub trait ScanObserver: Send + Sync {
    fn on_start(&self, _target: &ScanTarget, _config: &ScanConfig, _started_at: DateTime<Local>) {}

    fn on_result(&self, _result: &PortResult) {}

    fn on_progress(&self, _progress: Progress) {}

    fn on_complete(&self, _report: &ScanReport) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl ScanObserver for SilentObserver {}

/// Write the final report in a machine-readable format.
///
/// Plain output has already been printed live, so nothing is written for it.
pub fn write_report(report: &ScanReport, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Plain => Ok(()),
        OutputFormat::Json => print_json(report),
        OutputFormat::Csv => print_csv(report),
    }
}
