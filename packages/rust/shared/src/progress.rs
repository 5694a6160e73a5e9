//! Progress counters, throughput and ETA.
//!
//! The tracker is shared by reference between the coordinator and whoever
//! renders progress. Completion is a single atomic increment, so recording
//! never takes a lock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::types::{RunSummary, UnitStatus};

/// Point-in-time view of a run's progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub processed: usize,
    pub total: usize,
    /// `total` is a guess (web mode) rather than a count.
    pub estimated: bool,
    pub elapsed: Duration,
    /// Units per second, once anything has completed.
    pub rate: Option<f64>,
    /// Remaining time, when it can be computed.
    pub eta: Option<Duration>,
}

impl ProgressSnapshot {
    /// Completion percentage, or `None` once an estimated total is exceeded.
    pub fn percent(&self) -> Option<f64> {
        if self.total == 0 || self.processed > self.total {
            return None;
        }
        Some(self.processed as f64 * 100.0 / self.total as f64)
    }
}

/// Counts completed units against a known or estimated total.
#[derive(Debug)]
pub struct ProgressTracker {
    processed: AtomicUsize,
    total: usize,
    estimated: bool,
    started: Instant,
}

impl ProgressTracker {
    /// Tracker for a run whose unit count is known up front.
    pub fn new(total: usize) -> Self {
        Self::starting_at(total, false, Instant::now())
    }

    /// Tracker whose total is only a guess.
    pub fn estimated(estimate: usize) -> Self {
        Self::starting_at(estimate, true, Instant::now())
    }

    fn starting_at(total: usize, estimated: bool, started: Instant) -> Self {
        Self {
            processed: AtomicUsize::new(0),
            total,
            estimated,
            started,
        }
    }

    /// Record one completed unit, whatever its status. Returns the new count.
    pub fn record(&self) -> usize {
        self.processed.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.snapshot_after(self.started.elapsed())
    }

    fn snapshot_after(&self, elapsed: Duration) -> ProgressSnapshot {
        let processed = self.processed();
        let secs = elapsed.as_secs_f64();

        let rate = (processed > 0 && secs > 0.0).then(|| processed as f64 / secs);
        let eta = match rate {
            Some(rate) if processed <= self.total => {
                let remaining = (self.total - processed) as f64;
                Some(Duration::from_secs_f64(remaining / rate))
            }
            _ => None,
        };

        ProgressSnapshot {
            processed,
            total: self.total,
            estimated: self.estimated,
            elapsed,
            rate,
            eta,
        }
    }
}

/// Progress callback for reporting run status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called once per completed unit, in completion order.
    fn unit_done(&self, identity: &str, status: UnitStatus, snapshot: &ProgressSnapshot);
    /// Called when the run completes.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn unit_done(&self, _identity: &str, _status: UnitStatus, _snapshot: &ProgressSnapshot) {}
    fn done(&self, _summary: &RunSummary) {}
}
