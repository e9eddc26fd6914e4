//! Shared counters for the /health endpoint.
//! Updated by the analysis recalculation path.

use std::sync::atomic::{AtomicU64, Ordering};

/// Service health metrics. Written by request handlers, read by /health.
#[derive(Default)]
pub struct HealthState {
    /// Completed analysis recalculations since startup.
    pub recalculations: AtomicU64,
    /// Timeframe results or overall metrics that failed to persist.
    pub persist_failures: AtomicU64,
    /// Nanosecond timestamp of the last completed recalculation (0 = none).
    pub last_recalculated_at_ns: AtomicU64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_recalculation(&self, at_ns: u64) {
        self.recalculations.fetch_add(1, Ordering::Relaxed);
        self.last_recalculated_at_ns.store(at_ns, Ordering::Relaxed);
    }

    pub fn inc_persist_failures(&self) {
        self.persist_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn recalculations(&self) -> u64 {
        self.recalculations.load(Ordering::Relaxed)
    }

    pub fn persist_failures(&self) -> u64 {
        self.persist_failures.load(Ordering::Relaxed)
    }

    pub fn last_recalculated_at_ns(&self) -> u64 {
        self.last_recalculated_at_ns.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let health = HealthState::new();
        health.record_recalculation(10);
        health.record_recalculation(20);
        health.inc_persist_failures();
        assert_eq!(health.recalculations(), 2);
        assert_eq!(health.persist_failures(), 1);
        assert_eq!(health.last_recalculated_at_ns(), 20);
    }
}
