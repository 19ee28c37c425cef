use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

pub struct Metrics {
    // Counters
    total_requests: AtomicUsize,
    completed_requests: AtomicUsize,
    error_requests: AtomicUsize,

    // Timing (in microseconds)
    total_query_time_us: AtomicU64,

    by_analysis_type: DashMap<String, usize>,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            total_requests: AtomicUsize::new(0),
            completed_requests: AtomicUsize::new(0),
            error_requests: AtomicUsize::new(0),
            total_query_time_us: AtomicU64::new(0),
            by_analysis_type: DashMap::new(),
        })
    }

    pub fn record_query(&self, analysis_type: Option<&str>, completed: bool, duration: Duration) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if completed {
            self.completed_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.error_requests.fetch_add(1, Ordering::Relaxed);
        }
        self.total_query_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);

        let key = analysis_type.unwrap_or("unclassified").to_string();
        *self.by_analysis_type.entry(key).or_insert(0) += 1;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let total = self.total_requests.load(Ordering::Relaxed);
        let total_us = self.total_query_time_us.load(Ordering::Relaxed) as f64;

        MetricsSnapshot {
            total_requests: total,
            completed_requests: self.completed_requests.load(Ordering::Relaxed),
            error_requests: self.error_requests.load(Ordering::Relaxed),
            avg_query_time_ms: if total > 0 {
                total_us / total as f64 / 1000.0
            } else {
                0.0
            },
            by_analysis_type: self
                .by_analysis_type
                .iter()
                .map(|r| (r.key().clone(), *r.value()))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: usize,
    pub completed_requests: usize,
    pub error_requests: usize,
    pub avg_query_time_ms: f64,
    pub by_analysis_type: BTreeMap<String, usize>,
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
