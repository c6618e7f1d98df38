//! Scan engine: validation, bounded dispatch, draining and cancellation.
//!
//! State machine:
//!
//! ```text
//! Idle -> Validating -> Running -> Draining -> Completed
//!             |            |          |
//!             |            +----------+--> Interrupted
//!             +--> Completed (validation error, no network activity)
//! ```

use crate::config::ScanConfig;
use crate::error::{ScanError, ScanResult};
use crate::output::ScanObserver;
use crate::scanner::gate::AdmissionGate;
use crate::scanner::stats::ScanStats;
use crate::scanner::tcp::TcpProbe;
use crate::scanner::traits::{PortProbe, PortResult};
use crate::scanner::ScanReport;
use crate::types::ScanTarget;
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Lifecycle of a single scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Validating,
    Running,
    Draining,
    Completed,
    Interrupted,
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Validating => write!(f, "validating"),
            Self::Running => write!(f, "running"),
            Self::Draining => write!(f, "draining"),
            Self::Completed => write!(f, "completed"),
            Self::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Runs one scan of one target over one port range.
pub struct ScanEngine {
    target: String,
    start_port: u32,
    end_port: u32,
    config: ScanConfig,
    probe: Option<Arc<dyn PortProbe>>,
    state: ScanState,
    peak_in_flight: usize,
}

impl ScanEngine {
    /// Prepare a scan. Nothing is validated until [`run`](Self::run).
    pub fn new(
        target: impl Into<String>,
        start_port: u32,
        end_port: u32,
        config: ScanConfig,
    ) -> Self {
        Self {
            target: target.into(),
            start_port,
            end_port,
            config,
            probe: None,
            state: ScanState::Idle,
            peak_in_flight: 0,
        }
    }

    /// Use `probe` instead of the TCP probe built from the validated target.
    pub fn with_probe(mut self, probe: Arc<dyn PortProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Highest number of probes that were in flight at once during the last run.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight
    }

    /// Run the scan, stopping early on Ctrl-C or SIGTERM.
    pub async fn run(&mut self, observer: Arc<dyn ScanObserver>) -> ScanResult<ScanReport> {
        self.execute(observer, CancellationToken::new(), true).await
    }

    /// Run the scan, stopping early when `cancel` fires. No signal handler
    /// is installed.
    pub async fn run_with_cancel(
        &mut self,
        observer: Arc<dyn ScanObserver>,
        cancel: CancellationToken,
    ) -> ScanResult<ScanReport> {
        self.execute(observer, cancel, false).await
    }

    fn transition(&mut self, next: ScanState) {
        debug!(from = %self.state, to = %next, "scan state");
        self.state = next;
    }

    async fn execute(
        &mut self,
        observer: Arc<dyn ScanObserver>,
        cancel: CancellationToken,
        listen_for_signals: bool,
    ) -> ScanResult<ScanReport> {
        self.transition(ScanState::Validating);
        let (target, probe) = match self.prepare().await {
            Ok(prepared) => prepared,
            Err(e) => {
                self.transition(ScanState::Completed);
                return Err(e);
            }
        };

        let signals = listen_for_signals.then(|| spawn_interrupt_listener(cancel.clone()));
        let outcome = self.dispatch(&target, probe, observer, &cancel).await;
        if let Some(listener) = signals {
            listener.abort();
        }
        outcome
    }

    /// Validate inputs and build the probe. No socket is opened here.
    async fn prepare(&self) -> ScanResult<(ScanTarget, Arc<dyn PortProbe>)> {
        self.config.validate()?;
        let target =
            ScanTarget::validate(&self.target, self.start_port, self.end_port).await?;

        let probe: Arc<dyn PortProbe> = match &self.probe {
            Some(probe) => Arc::clone(probe),
            None => Arc::new(TcpProbe::new(target.clone(), self.config.clone())?),
        };
        Ok((target, probe))
    }

    async fn dispatch(
        &mut self,
        target: &ScanTarget,
        probe: Arc<dyn PortProbe>,
        observer: Arc<dyn ScanObserver>,
        cancel: &CancellationToken,
    ) -> ScanResult<ScanReport> {
        self.transition(ScanState::Running);

        let stats = Arc::new(ScanStats::new(target.range.len()));
        observer.on_start(target, &self.config, stats.started_at());
        info!(
            host = %target,
            range = %target.range,
            concurrency = self.config.concurrency,
            "scan started"
        );

        let (tx, rx) = mpsc::channel::<PortResult>(self.config.concurrency);
        let consumer = tokio::spawn(consume_results(rx, Arc::clone(&observer)));
        let gate = AdmissionGate::new(self.config.concurrency);
        let mut probes = JoinSet::new();

        for port in target.range.iter() {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(self.interrupt(&mut probes, &consumer, &gate));
                }
                permit = gate.admit() => permit?,
            };

            let probe = Arc::clone(&probe);
            let stats = Arc::clone(&stats);
            let observer = Arc::clone(&observer);
            let tx = tx.clone();

            probes.spawn(async move {
                let outcome = AssertUnwindSafe(probe.probe(port, &stats))
                    .catch_unwind()
                    .await;
                let result = match outcome {
                    Ok(result) => result,
                    Err(panic) => {
                        error!(%port, reason = panic_message(&*panic), "probe panicked");
                        None
                    }
                };

                if let Some(result) = result {
                    // The consumer only goes away when the scan is torn down.
                    let _ = tx.send(result).await;
                }

                let progress = stats.record_scanned();
                drop(permit);
                if progress.should_report() {
                    observer.on_progress(progress);
                }
            });

            while let Some(joined) = probes.try_join_next() {
                log_join_error(joined);
            }
        }
        drop(tx);

        self.transition(ScanState::Draining);
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(self.interrupt(&mut probes, &consumer, &gate));
                }
                joined = probes.join_next() => match joined {
                    Some(joined) => log_join_error(joined),
                    None => break,
                },
            }
        }

        let results = consumer
            .await
            .map_err(|e| ScanError::TaskFailed(e.to_string()))?;

        self.peak_in_flight = gate.peak();
        debug!(peak = self.peak_in_flight, capacity = gate.capacity(), "admission gate drained");

        let report = ScanReport::new(target, &self.config, &stats, results);
        self.transition(ScanState::Completed);
        info!(open = report.open_ports, scanned = report.ports_scanned, "scan complete");
        observer.on_complete(&report);

        Ok(report)
    }

    /// Abandon in-flight probes. Aborted tasks drop their sockets.
    fn interrupt(
        &mut self,
        probes: &mut JoinSet<()>,
        consumer: &JoinHandle<Vec<PortResult>>,
        gate: &AdmissionGate,
    ) -> ScanError {
        info!(in_flight = gate.in_flight(), "scan interrupted, abandoning in-flight probes");
        probes.abort_all();
        consumer.abort();
        self.peak_in_flight = gate.peak();
        self.transition(ScanState::Interrupted);
        ScanError::Interrupted
    }
}

/// Print and collect results as they arrive, in completion order.
async fn consume_results(
    mut rx: mpsc::Receiver<PortResult>,
    observer: Arc<dyn ScanObserver>,
) -> Vec<PortResult> {
    let mut results = Vec::new();
    while let Some(result) = rx.recv().await {
        observer.on_result(&result);
        results.push(result);
    }
    results
}

fn spawn_interrupt_listener(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        wait_for_interrupt().await;
        info!("interrupt received");
        cancel.cancel();
    })
}

#[cfg(unix)]
async fn wait_for_interrupt() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(_) => ctrl_c().await,
    }
}

#[cfg(not(unix))]
async fn wait_for_interrupt() {
    ctrl_c().await
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(%err, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

fn log_join_error(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        if !e.is_cancelled() {
            error!(error = %e, "probe task failed");
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::SilentObserver;
    use crate::types::{Port, PortError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingProbe {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PortProbe for CountingProbe {
        async fn probe(&self, _port: Port, _stats: &ScanStats) -> Option<PortResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            None
        }
    }

    #[tokio::test]
    async fn test_state_after_success() {
        let probe = Arc::new(CountingProbe::default());
        let mut engine = ScanEngine::new("127.0.0.1", 10, 19, ScanConfig::new())
            .with_probe(probe.clone());
        assert_eq!(engine.state(), ScanState::Idle);

        let report = engine
            .run_with_cancel(Arc::new(SilentObserver), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(engine.state(), ScanState::Completed);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 10);
        assert_eq!(report.ports_scanned, 10);
        assert!(report.results.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_range_never_probes() {
        let probe = Arc::new(CountingProbe::default());
        let mut engine =
            ScanEngine::new("127.0.0.1", 500, 100, ScanConfig::new()).with_probe(probe.clone());

        let err = engine
            .run_with_cancel(Arc::new(SilentObserver), CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ScanError::InvalidPortRange(PortError::Inverted { .. })
        ));
        assert_eq!(engine.state(), ScanState::Completed);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_config_never_probes() {
        let probe = Arc::new(CountingProbe::default());
        let config = ScanConfig::new().with_concurrency(0);
        let mut engine = ScanEngine::new("127.0.0.1", 1, 10, config).with_probe(probe.clone());

        let err = engine
            .run_with_cancel(Arc::new(SilentObserver), CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ScanError::InvalidConfig(_)));
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*boxed), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(&*boxed), "bang");
        let boxed: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(&*boxed), "unknown panic");
    }
}
