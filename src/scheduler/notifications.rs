//! Keeps the set of registered reminder jobs in line with the configured times.

use super::delay::compute_initial_delay;
use super::jobs::{JobAction, JobScheduler, PeriodicJob};
use crate::clock::Clock;
use crate::error::{SchedulerError, SchedulerResult};
use crate::models::NotificationTime;
use crate::observability::MetricsTracker;
use crate::reminders::ReminderEvaluator;
use chrono::{DateTime, Local};
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Tag carried by every reminder job.
pub const REMINDER_TAG: &str = "call_reminders";

/// Reminders repeat once per day.
pub const REMINDER_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// Tag identifying the job of one reminder time.
pub fn entry_tag(id: &str) -> String {
    format!("notification_{}", id)
}

/// Registers one daily job per enabled [`NotificationTime`].
///
/// `reschedule`, `cancel` and `cancel_all` are serialized against each other;
/// fires run independently of all three.
pub struct NotificationScheduler {
    jobs: Arc<dyn JobScheduler>,
    evaluator: Arc<ReminderEvaluator>,
    clock: Arc<dyn Clock>,
    metrics: MetricsTracker,
    lock: Mutex<()>,
}

impl NotificationScheduler {
    pub fn new(
        jobs: Arc<dyn JobScheduler>,
        evaluator: Arc<ReminderEvaluator>,
        clock: Arc<dyn Clock>,
        metrics: MetricsTracker,
    ) -> Self {
        Self {
            jobs,
            evaluator,
            clock,
            metrics,
            lock: Mutex::new(()),
        }
    }

    /// Replace every reminder job with one per enabled entry in `times`.
    ///
    /// Returns the number of jobs registered. If a registration fails the
    /// error is returned immediately: jobs cancelled earlier in this call stay
    /// cancelled and entries after the failing one are not registered.
    pub async fn reschedule(&self, times: &[NotificationTime]) -> SchedulerResult<usize> {
        let _guard = self.lock.lock().await;

        let cancelled = self.jobs.cancel_by_tag(REMINDER_TAG).await;
        let now = self.clock.now();

        let mut registered = 0;
        for time in times.iter().filter(|t| t.is_enabled) {
            let job = self.build_job(time, &now)?;
            if let Err(e) = self.jobs.register(job).await {
                warn!(
                    reminder_id = %time.id,
                    registered,
                    "Reminder registration failed, earlier cancellations are not restored: {}",
                    e
                );
                return Err(e);
            }
            registered += 1;
        }

        self.metrics.track_reschedule(registered);
        info!(cancelled, registered, "Reminders rescheduled");
        Ok(registered)
    }

    /// Stop the job of one reminder time, leaving the others running.
    pub async fn cancel(&self, id: &str) -> usize {
        let _guard = self.lock.lock().await;
        self.jobs.cancel_by_tag(&entry_tag(id)).await
    }

    /// Stop every reminder job.
    pub async fn cancel_all(&self) -> usize {
        let _guard = self.lock.lock().await;
        self.jobs.cancel_by_tag(REMINDER_TAG).await
    }

    fn build_job(&self, time: &NotificationTime, now: &DateTime<Local>) -> SchedulerResult<PeriodicJob> {
        let at = time.naive_time().ok_or_else(|| SchedulerError::Registration {
            id: time.id.clone(),
            reason: format!("invalid time of day {}", time.time_string()),
        })?;

        let initial_delay = compute_initial_delay(now, at);
        debug!(
            reminder_id = %time.id,
            at = %time.time_string(),
            initial_delay_ms = initial_delay.as_millis() as u64,
            "Built reminder job"
        );

        let evaluator = self.evaluator.clone();
        let action: JobAction = Arc::new(move || {
            let evaluator = evaluator.clone();
            async move {
                evaluator.evaluate().await;
            }
            .boxed()
        });

        Ok(PeriodicJob {
            name: format!("reminder {} ({})", time.time_string(), time.id),
            initial_delay,
            period: REMINDER_PERIOD,
            tags: vec![REMINDER_TAG.to_string(), entry_tag(&time.id)],
            action,
        })
    }
}
