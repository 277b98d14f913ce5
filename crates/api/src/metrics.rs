use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::cache::CacheStats;

pub struct Metrics {
    // Counters
    total_runs: AtomicUsize,
    failed_runs: AtomicUsize,
    total_evaluations: AtomicUsize,
    failed_evaluations: AtomicUsize,

    // Timing (in microseconds)
    total_run_time_us: AtomicU64,
    total_evaluation_time_us: AtomicU64,

    // Last successful run
    families: AtomicUsize,
    candidates: AtomicUsize,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            total_runs: AtomicUsize::new(0),
            failed_runs: AtomicUsize::new(0),
            total_evaluations: AtomicUsize::new(0),
            failed_evaluations: AtomicUsize::new(0),
            total_run_time_us: AtomicU64::new(0),
            total_evaluation_time_us: AtomicU64::new(0),
            families: AtomicUsize::new(0),
            candidates: AtomicUsize::new(0),
        })
    }

    pub fn record_run(&self, duration: Duration, outcome: Option<(usize, usize)>) {
        self.total_runs.fetch_add(1, Ordering::Relaxed);
        self.total_run_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        match outcome {
            Some((families, candidates)) => {
                self.families.store(families, Ordering::Relaxed);
                self.candidates.store(candidates, Ordering::Relaxed);
            }
            None => {
                self.failed_runs.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn record_evaluation(&self, duration: Duration, success: bool) {
        self.total_evaluations.fetch_add(1, Ordering::Relaxed);
        self.total_evaluation_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        if !success {
            self.failed_evaluations.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self, cache: Option<CacheStats>) -> MetricsSnapshot {
        MetricsSnapshot {
            total_runs: self.total_runs.load(Ordering::Relaxed),
            failed_runs: self.failed_runs.load(Ordering::Relaxed),
            total_evaluations: self.total_evaluations.load(Ordering::Relaxed),
            failed_evaluations: self.failed_evaluations.load(Ordering::Relaxed),
            avg_run_time_ms: avg_time_ms(&self.total_run_time_us, &self.total_runs),
            avg_evaluation_time_ms: avg_time_ms(
                &self.total_evaluation_time_us,
                &self.total_evaluations,
            ),
            families: self.families.load(Ordering::Relaxed),
            candidates: self.candidates.load(Ordering::Relaxed),
            cache,
        }
    }
}

fn avg_time_ms(total_us: &AtomicU64, count: &AtomicUsize) -> f64 {
    let total = total_us.load(Ordering::Relaxed) as f64;
    let cnt = count.load(Ordering::Relaxed) as f64;
    if cnt > 0.0 {
        total / cnt / 1000.0
    } else {
        0.0
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_runs: usize,
    pub failed_runs: usize,
    pub total_evaluations: usize,
    pub failed_evaluations: usize,
    pub avg_run_time_ms: f64,
    pub avg_evaluation_time_ms: f64,
    pub families: usize,
    pub candidates: usize,
    pub cache: Option<CacheStats>,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_counters() {
        let metrics = Metrics::new();
        metrics.record_run(Duration::from_millis(4), Some((3, 12)));
        metrics.record_run(Duration::from_millis(2), None);

        let snapshot = metrics.snapshot(None);
        assert_eq!(snapshot.total_runs, 2);
        assert_eq!(snapshot.failed_runs, 1);
        assert_eq!(snapshot.families, 3);
        assert_eq!(snapshot.candidates, 12);
        assert!((snapshot.avg_run_time_ms - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_snapshot_has_zero_averages() {
        let snapshot = Metrics::new().snapshot(None);
        assert_eq!(snapshot.avg_evaluation_time_ms, 0.0);
    }
}
