use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

pub struct Metrics {
    // Counters
    total_requests: AtomicUsize,
    split_requests: AtomicUsize,
    parse_requests: AtomicUsize,
    failed_requests: AtomicUsize,

    // Documents
    total_documents: AtomicUsize,
    degraded_documents: AtomicUsize,

    // Timing (in microseconds)
    total_process_time_us: AtomicU64,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            total_requests: AtomicUsize::new(0),
            split_requests: AtomicUsize::new(0),
            parse_requests: AtomicUsize::new(0),
            failed_requests: AtomicUsize::new(0),
            total_documents: AtomicUsize::new(0),
            degraded_documents: AtomicUsize::new(0),
            total_process_time_us: AtomicU64::new(0),
        })
    }

    pub fn record_request(&self, parse: bool, documents: usize, degraded: usize, duration: Duration) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if parse {
            self.parse_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.split_requests.fetch_add(1, Ordering::Relaxed);
        }
        self.total_documents.fetch_add(documents, Ordering::Relaxed);
        self.degraded_documents.fetch_add(degraded, Ordering::Relaxed);
        self.total_process_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    /// A call that never produced a response (worker panicked or was cancelled).
    pub fn record_failure(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let completed = self.split_requests.load(Ordering::Relaxed)
            + self.parse_requests.load(Ordering::Relaxed);
        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            split_requests: self.split_requests.load(Ordering::Relaxed),
            parse_requests: self.parse_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            total_documents: self.total_documents.load(Ordering::Relaxed),
            degraded_documents: self.degraded_documents.load(Ordering::Relaxed),
            avg_request_time_ms: avg_time_ms(&self.total_process_time_us, completed),
        }
    }
}

fn avg_time_ms(total_us: &AtomicU64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    total_us.load(Ordering::Relaxed) as f64 / count as f64 / 1000.0
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: usize,
    pub split_requests: usize,
    pub parse_requests: usize,
    pub failed_requests: usize,
    pub total_documents: usize,
    pub degraded_documents: usize,
    pub avg_request_time_ms: f64,
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
    fn test_snapshot_counts() {
        let metrics = Metrics::new();
        metrics.record_request(false, 3, 0, Duration::from_millis(2));
        metrics.record_request(true, 2, 1, Duration::from_millis(4));
        metrics.record_failure();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_requests, 3);
        assert_eq!(snapshot.split_requests, 1);
        assert_eq!(snapshot.parse_requests, 1);
        assert_eq!(snapshot.failed_requests, 1);
        assert_eq!(snapshot.total_documents, 5);
        assert_eq!(snapshot.degraded_documents, 1);
        assert!((snapshot.avg_request_time_ms - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_average() {
        assert_eq!(Metrics::new().snapshot().avg_request_time_ms, 0.0);
    }
}
