//! Admission gate bounding the number of in-flight probes.
//!
//! A counting semaphore with instrumentation: it tracks how many permits are
//! currently held and the highest count ever observed, so the concurrency
//! bound can be checked after a scan.

use crate::error::{ScanError, ScanResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Debug, Default)]
struct Occupancy {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// Capacity-limited gate. Acquire before spawning, release on completion.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    occupancy: Arc<Occupancy>,
    capacity: usize,
}

/// A held slot. Dropping it frees the slot.
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
    occupancy: Arc<Occupancy>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        // Runs before the semaphore permit field is released, so the
        // in-flight count never exceeds the permits actually held.
        self.occupancy.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl AdmissionGate {
    /// Create a gate with `capacity` slots.
    ///
    /// `capacity` must be between 1 and `Semaphore::MAX_PERMITS`, which
    /// `ScanConfig::validate` guarantees.
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            occupancy: Arc::new(Occupancy::default()),
            capacity,
        }
    }

    /// Wait for a free slot.
    pub async fn admit(&self) -> ScanResult<GatePermit> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|e| ScanError::TaskFailed(e.to_string()))?;

        let now = self.occupancy.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.occupancy.peak.fetch_max(now, Ordering::SeqCst);

        Ok(GatePermit {
            _permit: permit,
            occupancy: Arc::clone(&self.occupancy),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently held.
    pub fn in_flight(&self) -> usize {
        self.occupancy.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of slots ever held at once.
    pub fn peak(&self) -> usize {
        self.occupancy.peak.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_admit_and_release() {
        let gate = AdmissionGate::new(2);
        let first = gate.admit().await.unwrap();
        let second = gate.admit().await.unwrap();
        assert_eq!(gate.in_flight(), 2);

        drop(first);
        assert_eq!(gate.in_flight(), 1);
        drop(second);
        assert_eq!(gate.in_flight(), 0);
        assert_eq!(gate.peak(), 2);
    }

    #[tokio::test]
    async fn test_full_gate_blocks() {
        let gate = AdmissionGate::new(1);
        let held = gate.admit().await.unwrap();

        let blocked = tokio::time::timeout(Duration::from_millis(50), gate.admit()).await;
        assert!(blocked.is_err());

        drop(held);
        let admitted = tokio::time::timeout(Duration::from_millis(50), gate.admit()).await;
        assert!(admitted.is_ok());
    }

    #[tokio::test]
    async fn test_peak_never_exceeds_capacity() {
        let gate = AdmissionGate::new(3);
        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..20 {
            let permit = gate.admit().await.unwrap();
            tasks.spawn(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                drop(permit);
            });
        }
        while tasks.join_next().await.is_some() {}

        assert_eq!(gate.peak(), 3);
        assert_eq!(gate.in_flight(), 0);
        assert_eq!(gate.capacity(), 3);
    }
}
