//! JSON output formatting.

use crate::scanner::ScanReport;
use anyhow::Context;
use std::io::{self, Write};

/// Print the report as pretty JSON to stdout.
pub fn print_json(report: &ScanReport) -> anyhow::Result<()> {
    write_json(report, io::stdout().lock())
}

pub fn write_json<W: Write>(report: &ScanReport, mut out: W) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut out, report).context("serializing report")?;
    writeln!(out)?;
    Ok(())
}
