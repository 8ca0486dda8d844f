//! Metrics collection for the sync driver

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by the driver. All relaxed; read for reporting only.
#[derive(Debug, Default)]
pub struct DriverMetrics {
    /// State transitions, self-transitions included
    pub transitions: AtomicU64,

    /// Transitions forced by the liveness watchdog
    pub watchdog_recoveries: AtomicU64,

    /// Blocks accepted by chain state via `ingest`
    pub blocks_accepted: AtomicU64,

    /// Blocks rejected by chain state via `ingest`
    pub blocks_rejected: AtomicU64,

    /// Blocks relayed to peers
    pub broadcasts_relayed: AtomicU64,

    /// Mining jobs handed to the worker
    pub mining_starts: AtomicU64,
}

impl DriverMetrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a state transition
    pub fn record_transition(&self) {
        self.transitions.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a watchdog-forced transition
    pub fn record_watchdog_recovery(&self) {
        self.watchdog_recoveries.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of an ingested block
    pub fn record_ingest(&self, accepted: bool) {
        if accepted {
            self.blocks_accepted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.blocks_rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a relayed block
    pub fn record_broadcast(&self) {
        self.broadcasts_relayed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a mining job start
    pub fn record_mining_start(&self) {
        self.mining_starts.fetch_add(1, Ordering::Relaxed);
    }

    /// Fraction of ingested blocks that were accepted
    pub fn acceptance_ratio(&self) -> f64 {
        let accepted = self.blocks_accepted.load(Ordering::Relaxed);
        let total = accepted + self.blocks_rejected.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        accepted as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_counters() {
        let metrics = DriverMetrics::new();

        metrics.record_ingest(true);
        metrics.record_ingest(true);
        metrics.record_ingest(true);
        metrics.record_ingest(false);

        assert_eq!(metrics.blocks_accepted.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.blocks_rejected.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.acceptance_ratio(), 0.75);
    }

    #[test]
    fn test_empty_ratio() {
        assert_eq!(DriverMetrics::new().acceptance_ratio(), 0.0);
    }
}
