//! CSV output formatting.

use crate::scanner::ScanReport;
use std::io::{self, Write};

/// Print open ports as CSV to stdout.
pub fn print_csv(report: &ScanReport) -> anyhow::Result<()> {
    write_csv(report, io::stdout().lock())
}

pub fn write_csv<W: Write>(report: &ScanReport, out: W) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);

    wtr.write_record(["port", "service", "banner"])?;
    for result in &report.results {
        wtr.write_record([
            result.port.to_string().as_str(),
            result.service.as_str(),
            result.banner.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
