// Statistics sink for the number of candidates each call discovers.
//
// The scorer reports exactly once per call, after aggregation, with the
// number of distinct candidates in the accumulator (zero included).

use std::sync::atomic::{AtomicU64, Ordering};

pub trait CandidateStats {
    fn record_candidate_count(&self, count: usize);
}

impl<F> CandidateStats for F
where
    F: Fn(usize),
{
    fn record_candidate_count(&self, count: usize) {
        self(count)
    }
}

/// Discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStats;

impl CandidateStats for NullStats {
    fn record_candidate_count(&self, _count: usize) {}
}

/// Lock-free running totals, shareable across concurrent calls.
#[derive(Debug, Default)]
pub struct StatsCounter {
    calls: AtomicU64,
    total: AtomicU64,
    max: AtomicU64,
}

/// Point-in-time copy of a `StatsCounter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub calls: u64,
    pub total: u64,
    pub max: u64,
}

impl StatsSnapshot {
    pub fn mean(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.total as f64 / self.calls as f64
        }
    }
}

impl StatsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            calls: self.calls.load(Ordering::Relaxed),
            total: self.total.load(Ordering::Relaxed),
            max: self.max.load(Ordering::Relaxed),
        }
    }
}

impl CandidateStats for StatsCounter {
    fn record_candidate_count(&self, count: usize) {
        let count = count as u64;
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.total.fetch_add(count, Ordering::Relaxed);
        self.max.fetch_max(count, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_closure_sink() {
        let seen = RefCell::new(Vec::new());
        let sink = |n: usize| seen.borrow_mut().push(n);
        sink.record_candidate_count(3);
        sink.record_candidate_count(0);
        assert_eq!(*seen.borrow(), vec![3, 0]);
    }

    #[test]
    fn test_counter_totals() {
        let counter = StatsCounter::new();
        counter.record_candidate_count(4);
        counter.record_candidate_count(10);
        counter.record_candidate_count(0);
        let snap = counter.snapshot();
        assert_eq!(
            snap,
            StatsSnapshot {
                calls: 3,
                total: 14,
                max: 10
            }
        );
        assert!((snap.mean() - 14.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_counter_mean() {
        assert_eq!(StatsCounter::new().snapshot().mean(), 0.0);
    }
}
