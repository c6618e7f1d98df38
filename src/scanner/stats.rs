//! Shared scan counters.
//!
//! The open-port count and the scanned count are the only state shared
//! between probes. Both sit behind one mutex that is held for the increment
//! alone, never across I/O.

use chrono::{DateTime, Local};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Counters {
    open: usize,
    scanned: usize,
    finished_at: Option<DateTime<Local>>,
}

/// Counters and timestamps for one scan.
#[derive(Debug)]
pub struct ScanStats {
    counters: Mutex<Counters>,
    total: usize,
    started_at: DateTime<Local>,
    started: Instant,
}

/// Point-in-time view of scan progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub scanned: usize,
    pub total: usize,
}

impl Progress {
    /// Completion in percent.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.scanned as f64 / self.total as f64 * 100.0
    }

    /// Whether this step should be shown: roughly every hundredth of the
    /// range, and always on the final port.
    pub fn should_report(&self) -> bool {
        let step = self.total / 100 + 1;
        self.scanned % step == 0 || self.scanned == self.total
    }

    pub fn is_complete(&self) -> bool {
        self.scanned >= self.total
    }
}

impl ScanStats {
    /// Start the clock for a scan over `total` ports.
    pub fn new(total: usize) -> Self {
        Self {
            counters: Mutex::new(Counters::default()),
            total,
            started_at: Local::now(),
            started: Instant::now(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Counters> {
        // A panicking probe cannot leave a half-applied increment behind.
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count one more open port.
    pub fn record_open(&self) {
        self.lock().open += 1;
    }

    /// Count one more finished probe and return the progress it produced.
    pub fn record_scanned(&self) -> Progress {
        let mut counters = self.lock();
        counters.scanned += 1;
        Progress {
            scanned: counters.scanned,
            total: self.total,
        }
    }

    /// Stamp the end of the scan and return the end time.
    pub fn mark_finished(&self) -> DateTime<Local> {
        *self.lock().finished_at.get_or_insert_with(Local::now)
    }

    pub fn open_ports(&self) -> usize {
        self.lock().open
    }

    pub fn scanned(&self) -> usize {
        self.lock().scanned
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn progress(&self) -> Progress {
        Progress {
            scanned: self.scanned(),
            total: self.total,
        }
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Local>> {
        self.lock().finished_at
    }

    /// Time since the scan started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
