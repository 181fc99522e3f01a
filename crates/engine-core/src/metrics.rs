use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    runs_started: AtomicU64,
    runs_succeeded: AtomicU64,
    runs_failed: AtomicU64,
    fires_skipped: AtomicU64,
    rows_loaded: AtomicU64,
    rows_skipped: AtomicU64,
}

/// Process-wide execution counters, shared by the scheduler and runner.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub runs_started: u64,
    pub runs_succeeded: u64,
    pub runs_failed: u64,
    /// Fires dropped because the previous execution was still running.
    pub fires_skipped: u64,
    pub rows_loaded: u64,
    pub rows_skipped: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            inner: Arc::new(InnerMetrics::default()),
        }
    }

    pub fn increment_started(&self) {
        self.inner.runs_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_succeeded(&self) {
        self.inner.runs_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failed(&self) {
        self.inner.runs_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_skipped_fires(&self) {
        self.inner.fires_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_rows(&self, loaded: u64, skipped: u64) {
        self.inner.rows_loaded.fetch_add(loaded, Ordering::Relaxed);
        self.inner.rows_skipped.fetch_add(skipped, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            runs_started: self.inner.runs_started.load(Ordering::Relaxed),
            runs_succeeded: self.inner.runs_succeeded.load(Ordering::Relaxed),
            runs_failed: self.inner.runs_failed.load(Ordering::Relaxed),
            fires_skipped: self.inner.fires_skipped.load(Ordering::Relaxed),
            rows_loaded: self.inner.rows_loaded.load(Ordering::Relaxed),
            rows_skipped: self.inner.rows_skipped.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
