//! Process-wide counters exposed on `/metrics`.
//!
//! Created once at startup and shared through `AppState`.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct MetricsRegistry {
    http_requests: AtomicU64,
    pipeline_runs: AtomicU64,
    pipeline_failures: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub http_requests: u64,
    pub pipeline_runs: u64,
    pub pipeline_failures: u64,
}

impl MetricsSnapshot {
    /// Failed runs as a percentage of all runs, 0 when nothing has run
    pub fn failure_rate_percent(&self) -> f64 {
        if self.pipeline_runs == 0 {
            return 0.0;
        }
        self.pipeline_failures as f64 / self.pipeline_runs as f64 * 100.0
    }
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.http_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pipeline_run(&self, failed: bool) {
        self.pipeline_runs.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.pipeline_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            http_requests: self.http_requests.load(Ordering::Relaxed),
            pipeline_runs: self.pipeline_runs.load(Ordering::Relaxed),
            pipeline_failures: self.pipeline_failures.load(Ordering::Relaxed),
        }
    }

    /// Render the counters in the Prometheus text exposition format
    pub fn render(&self) -> String {
        let snapshot = self.snapshot();
        let mut out = String::new();

        for (name, help, value) in [
            ("http_requests_total", "Total Requests", snapshot.http_requests),
            (
                "pipeline_runs_total",
                "Total pipeline runs triggered",
                snapshot.pipeline_runs,
            ),
            (
                "pipeline_failures_total",
                "Total pipeline runs that did not complete",
                snapshot.pipeline_failures,
            ),
        ] {
            let _ = writeln!(out, "# HELP {} {}", name, help);
            let _ = writeln!(out, "# TYPE {} counter", name);
            let _ = writeln!(out, "{} {}", name, value);
        }

        out
    }
}
