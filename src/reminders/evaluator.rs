//! Decides, at each reminder fire, whether the user needs to be alerted.

use super::notifier::{Alert, Notifier};
use crate::clock::Clock;
use crate::error::EvaluationError;
use crate::observability::MetricsTracker;
use crate::repositories::CustomerRepository;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, warn};

/// What a single fire did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FireOutcome {
    /// One alert raised for this many customers due today
    Alerted(usize),
    /// Nobody due today; nothing shown
    NothingDue,
    /// Evaluation failed; nothing shown, the schedule carries on
    Failed(String),
}

/// Counts the customers promised for today and raises at most one alert.
pub struct ReminderEvaluator {
    customers: Arc<dyn CustomerRepository>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    metrics: MetricsTracker,
}

impl ReminderEvaluator {
    pub fn new(
        customers: Arc<dyn CustomerRepository>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        metrics: MetricsTracker,
    ) -> Self {
        Self {
            customers,
            notifier,
            clock,
            metrics,
        }
    }

    /// Run one fire.
    ///
    /// Never returns an error: failures are logged, counted and reported as
    /// [`FireOutcome::Failed`] so the recurring job keeps its schedule.
    pub async fn evaluate(&self) -> FireOutcome {
        let today = self.clock.today();

        match self.alert_if_due(today).await {
            Ok(0) => {
                self.metrics.track_fire(Some(0), true);
                info!(%today, "No customers due today");
                FireOutcome::NothingDue
            }
            Ok(count) => {
                self.metrics.track_fire(Some(count), true);
                info!(%today, count, "Raised call reminder");
                FireOutcome::Alerted(count)
            }
            Err(e) => {
                self.metrics.track_fire(None, false);
                warn!(%today, "Reminder evaluation failed: {}", e);
                FireOutcome::Failed(e.to_string())
            }
        }
    }

    async fn alert_if_due(&self, today: NaiveDate) -> Result<usize, EvaluationError> {
        let due = self.customers.list_for_date(today).await?.len();
        if due > 0 {
            self.notifier.show(&Alert::calls_due(due)).await?;
        }
        Ok(due)
    }
}
