//! Plain text output formatting.
//!
//! Header lines, one line per open port as it is found, a single redrawn
//! progress line and closing statistics.

use crate::config::ScanConfig;
use crate::output::ScanObserver;
use crate::scanner::{PortResult, Progress, ScanReport};
use crate::types::ScanTarget;
use chrono::{DateTime, Local, SecondsFormat};
use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::{Mutex, OnceLock, PoisonError};

/// Live console reporter.
///
/// The progress bar only draws when stdout is a terminal; result lines are
/// printed above it so the two never overwrite each other.
#[derive(Default)]
pub struct ConsoleReporter {
    progress: OnceLock<ProgressBar>,
    /// Highest scanned count drawn so far. Probe tasks report from several
    /// threads, so a late snapshot must not overwrite a newer one.
    shown: Mutex<usize>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn println(&self, line: String) {
        match self.progress.get() {
            Some(pb) => pb.suspend(|| println!("{line}")),
            None => println!("{line}"),
        }
    }
}

impl ScanObserver for ConsoleReporter {
    fn on_start(&self, target: &ScanTarget, config: &ScanConfig, started_at: DateTime<Local>) {
        println!("{} {}", style("Scanning target:").bold(), style(target).white().bold());
        println!("{} {}", style("Started at:").bold(), format_time(started_at));
        println!("{} {}", style("Port range:").bold(), target.range);
        println!("{} {}", style("SSL/TLS enabled:").bold(), config.use_tls);
        println!("{} {}", style("Concurrency:").bold(), config.concurrency);
        println!("Scanning {} ports...", style(target.range.len()).white().bold());

        let pb = ProgressBar::with_draw_target(
            Some(target.range.len() as u64),
            ProgressDrawTarget::stdout(),
        );
        pb.set_style(
            ProgressStyle::with_template("Progress: {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        // A second scan through the same reporter keeps the first bar.
        let _ = self.progress.set(pb);
    }

    fn on_result(&self, result: &PortResult) {
        self.println(format!(
            "Port {}: {} ({}) - {}",
            result.port,
            style("Open").green().bold(),
            style(&result.service).cyan(),
            result.banner
        ));
    }

    fn on_progress(&self, progress: Progress) {
        let Some(pb) = self.progress.get() else {
            return;
        };
        let mut shown = self.shown.lock().unwrap_or_else(PoisonError::into_inner);
        if progress.scanned <= *shown {
            return;
        }
        *shown = progress.scanned;
        draw_progress(pb, progress);
    }

    fn on_complete(&self, report: &ScanReport) {
        if let Some(pb) = self.progress.get() {
            let total = report.ports_scanned;
            draw_progress(pb, Progress { scanned: total, total });
            pb.finish();
        }
        println!();
        println!(
            "{} {} open ports",
            style("Scan complete:").bold(),
            style(report.open_ports).green().bold()
        );
        println!("{} {}", style("Finished at:").bold(), format_time(report.finished_at));
        println!(
            "{} {:.2} seconds",
            style("Elapsed:").bold(),
            report.duration_secs()
        );
    }
}

fn draw_progress(pb: &ProgressBar, progress: Progress) {
    pb.set_position(progress.scanned as u64);
    pb.set_message(format!(
        "{:.1}% ({}/{})",
        progress.percent(),
        progress.scanned,
        progress.total
    ));
}

fn format_time(time: DateTime<Local>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}
