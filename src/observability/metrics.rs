//! Counters for reminder fires and data interchange.
//!
//! This is the observability sink that failed fires and skipped rows report
//! to. Clones share the same counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Shared application counters.
#[derive(Debug, Clone)]
pub struct MetricsTracker {
    reminder_fires_total: Arc<AtomicU64>,
    alerts_total: Arc<AtomicU64>,
    evaluation_failures_total: Arc<AtomicU64>,
    reschedules_total: Arc<AtomicU64>,
    rows_imported_total: Arc<AtomicU64>,
    rows_skipped_total: Arc<AtomicU64>,
}

impl MetricsTracker {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            reminder_fires_total: Arc::new(AtomicU64::new(0)),
            alerts_total: Arc::new(AtomicU64::new(0)),
            evaluation_failures_total: Arc::new(AtomicU64::new(0)),
            reschedules_total: Arc::new(AtomicU64::new(0)),
            rows_imported_total: Arc::new(AtomicU64::new(0)),
            rows_skipped_total: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Track one reminder fire and how it ended.
    pub fn track_fire(&self, due_count: Option<usize>, success: bool) {
        self.reminder_fires_total.fetch_add(1, Ordering::Relaxed);

        if !success {
            self.evaluation_failures_total.fetch_add(1, Ordering::Relaxed);
        } else if due_count.unwrap_or(0) > 0 {
            self.alerts_total.fetch_add(1, Ordering::Relaxed);
        }

        tracing::debug!(
            due_count = due_count.unwrap_or(0),
            success = success,
            "Reminder fire completed"
        );
    }

    /// Track a completed reschedule.
    pub fn track_reschedule(&self, registered: usize) {
        self.reschedules_total.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(registered = registered, "Reschedule completed");
    }

    /// Track the outcome of one import.
    pub fn track_import(&self, imported: usize, skipped: usize) {
        self.rows_imported_total
            .fetch_add(imported as u64, Ordering::Relaxed);
        self.rows_skipped_total
            .fetch_add(skipped as u64, Ordering::Relaxed);

        tracing::info!(imported = imported, skipped = skipped, "Import completed");
    }

    pub fn reminder_fires_total(&self) -> u64 {
        self.reminder_fires_total.load(Ordering::Relaxed)
    }

    pub fn alerts_total(&self) -> u64 {
        self.alerts_total.load(Ordering::Relaxed)
    }

    pub fn evaluation_failures_total(&self) -> u64 {
        self.evaluation_failures_total.load(Ordering::Relaxed)
    }

    pub fn reschedules_total(&self) -> u64 {
        self.reschedules_total.load(Ordering::Relaxed)
    }

    pub fn rows_imported_total(&self) -> u64 {
        self.rows_imported_total.load(Ordering::Relaxed)
    }

    pub fn rows_skipped_total(&self) -> u64 {
        self.rows_skipped_total.load(Ordering::Relaxed)
    }

    /// Share of imported rows that had to be skipped (0.0 to 1.0).
    pub fn skip_rate(&self) -> f64 {
        let skipped = self.rows_skipped_total() as f64;
        let total = (self.rows_imported_total() + self.rows_skipped_total()) as f64;

        if total == 0.0 {
            0.0
        } else {
            skipped / total
        }
    }

    /// Print a summary of all metrics.
    pub fn summary(&self) -> String {
        format!(
            "Metrics Summary:\n\
             Reminder Fires: {}\n\
             Alerts Raised: {}\n\
             Failed Evaluations: {}\n\
             Reschedules: {}\n\
             Rows Imported: {}\n\
             Rows Skipped: {} ({:.2}% skip rate)",
            self.reminder_fires_total(),
            self.alerts_total(),
            self.evaluation_failures_total(),
            self.reschedules_total(),
            self.rows_imported_total(),
            self.rows_skipped_total(),
            self.skip_rate() * 100.0,
        )
    }
}

impl Default for MetricsTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// A timer for tracking operation duration.
pub struct Timer {
    start: Instant,
    operation: String,
}

impl Timer {
    /// Start a new timer for the given operation.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            operation: operation.into(),
        }
    }

    /// Finish the timer with a specific status, returning elapsed milliseconds.
    pub fn finish_with_status(self, success: bool) -> u128 {
        let duration_ms = self.start.elapsed().as_millis();

        if success {
            tracing::debug!(
                operation = %self.operation,
                duration_ms = duration_ms,
                "Operation succeeded"
            );
        } else {
            tracing::warn!(
                operation = %self.operation,
                duration_ms = duration_ms,
                "Operation failed"
            );
        }

        duration_ms
    }
}
