//! Observability for reminder fires and imports.
//!
//! Counters are the sink failed evaluations and skipped rows report to;
//! everything else goes through `tracing`.

pub mod metrics;

pub use metrics::{MetricsTracker, Timer};
