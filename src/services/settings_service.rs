//! Settings service layer.
//!
//! Reminder time management, data export/import and the "clear all" action.
//! Every change to the reminder times is persisted first, then the registered
//! jobs are rebuilt from the full stored list.

use crate::clock::Clock;
use crate::codec::{self, ImportReport, InterchangeFormat, SkippedRow};
use crate::error::{CodecError, ServiceError, ServiceResult, StoreError};
use crate::models::{ExportData, NotificationTime};
use crate::observability::{MetricsTracker, Timer};
use crate::repositories::{CustomerRepository, FollowUpRepository, PreferencesRepository};
use crate::scheduler::NotificationScheduler;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// What an import wrote to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSummary {
    pub customers: usize,
    pub follow_ups: usize,
    pub skipped: Vec<SkippedRow>,
}

impl From<&ImportReport> for ImportSummary {
    fn from(report: &ImportReport) -> Self {
        Self {
            customers: report.data.customers.len(),
            follow_ups: report.data.follow_ups.len(),
            skipped: report.skipped.clone(),
        }
    }
}

/// Settings service trait for business operations.
#[async_trait]
pub trait SettingsService: Send + Sync {
    /// Configured reminder times, in the order they were added.
    async fn notification_times(&self) -> ServiceResult<Vec<NotificationTime>>;

    /// Add an enabled reminder at `hour:minute`.
    async fn add_notification_time(&self, hour: u32, minute: u32) -> ServiceResult<NotificationTime>;

    /// Remove a reminder and stop its job.
    async fn remove_notification_time(&self, id: &str) -> ServiceResult<()>;

    /// Replace the hour, minute and enabled flag of an existing reminder.
    async fn update_notification_time(&self, time: NotificationTime) -> ServiceResult<NotificationTime>;

    async fn set_notification_enabled(&self, id: &str, enabled: bool) -> ServiceResult<NotificationTime>;

    /// Register jobs for the stored reminder times. Called at startup.
    async fn restore_schedule(&self) -> ServiceResult<usize>;

    /// Write every customer and follow-up to a new file in `dir`.
    async fn export_data(&self, format: InterchangeFormat, dir: &Path) -> ServiceResult<PathBuf>;

    /// Read an export file and merge its records into the store.
    async fn import_data(&self, path: &Path) -> ServiceResult<ImportSummary>;

    /// Delete every follow-up, then every customer. Reminder times are kept.
    async fn clear_all_data(&self) -> ServiceResult<()>;
}

/// Default implementation of SettingsService.
pub struct SettingsServiceImpl {
    customers: Arc<dyn CustomerRepository>,
    follow_ups: Arc<dyn FollowUpRepository>,
    preferences: Arc<dyn PreferencesRepository>,
    scheduler: Arc<NotificationScheduler>,
    clock: Arc<dyn Clock>,
    metrics: MetricsTracker,
    /// Held across read, edit, save and reschedule of the reminder times
    times_lock: Mutex<()>,
}

impl SettingsServiceImpl {
    pub fn new(
        customers: Arc<dyn CustomerRepository>,
        follow_ups: Arc<dyn FollowUpRepository>,
        preferences: Arc<dyn PreferencesRepository>,
        scheduler: Arc<NotificationScheduler>,
        clock: Arc<dyn Clock>,
        metrics: MetricsTracker,
    ) -> Self {
        Self {
            customers,
            follow_ups,
            preferences,
            scheduler,
            clock,
            metrics,
            times_lock: Mutex::new(()),
        }
    }

    /// Store `times` and rebuild the jobs from them.
    async fn save_and_reschedule(&self, times: &[NotificationTime]) -> ServiceResult<()> {
        self.preferences.set_notification_times(times).await?;
        self.scheduler.reschedule(times).await?;
        Ok(())
    }

    fn not_found(id: &str) -> ServiceError {
        StoreError::NotFound(format!("notification time {}", id)).into()
    }
}

#[async_trait]
impl SettingsService for SettingsServiceImpl {
    async fn notification_times(&self) -> ServiceResult<Vec<NotificationTime>> {
        Ok(self.preferences.notification_times().await?)
    }

    async fn add_notification_time(&self, hour: u32, minute: u32) -> ServiceResult<NotificationTime> {
        let time = NotificationTime::new(hour, minute)?;

        let _guard = self.times_lock.lock().await;
        let mut times = self.preferences.notification_times().await?;
        times.push(time.clone());
        self.save_and_reschedule(&times).await?;

        info!(id = %time.id, at = %time.time_string(), "Added reminder time");
        Ok(time)
    }

    async fn remove_notification_time(&self, id: &str) -> ServiceResult<()> {
        let _guard = self.times_lock.lock().await;
        let mut times = self.preferences.notification_times().await?;
        let before = times.len();
        times.retain(|t| t.id != id);
        if times.len() == before {
            return Err(Self::not_found(id));
        }

        self.scheduler.cancel(id).await;
        self.save_and_reschedule(&times).await?;

        info!(id, "Removed reminder time");
        Ok(())
    }

    async fn update_notification_time(&self, time: NotificationTime) -> ServiceResult<NotificationTime> {
        // Validates the hour and minute.
        NotificationTime::new(time.hour, time.minute)?;

        let _guard = self.times_lock.lock().await;
        let mut times = self.preferences.notification_times().await?;
        let slot = times
            .iter_mut()
            .find(|t| t.id == time.id)
            .ok_or_else(|| Self::not_found(&time.id))?;
        *slot = time.clone();
        self.save_and_reschedule(&times).await?;

        info!(id = %time.id, at = %time.time_string(), enabled = time.is_enabled, "Updated reminder time");
        Ok(time)
    }

    async fn set_notification_enabled(&self, id: &str, enabled: bool) -> ServiceResult<NotificationTime> {
        let _guard = self.times_lock.lock().await;
        let mut times = self.preferences.notification_times().await?;
        let slot = times
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| Self::not_found(id))?;
        slot.is_enabled = enabled;
        let updated = slot.clone();
        self.save_and_reschedule(&times).await?;

        info!(id, enabled, "Toggled reminder time");
        Ok(updated)
    }

    async fn restore_schedule(&self) -> ServiceResult<usize> {
        let _guard = self.times_lock.lock().await;
        let times = self.preferences.notification_times().await?;
        Ok(self.scheduler.reschedule(&times).await?)
    }

    async fn export_data(&self, format: InterchangeFormat, dir: &Path) -> ServiceResult<PathBuf> {
        let timer = Timer::new("export");
        let now = self.clock.now();

        let data = ExportData::new(
            self.customers.list().await?,
            self.follow_ups.list_all().await?,
            now.timestamp_millis(),
        );
        let bytes = codec::encode(&data, format)?;

        tokio::fs::create_dir_all(dir).await.map_err(CodecError::from)?;
        let path = dir.join(codec::export_file_name(format, &now));
        tokio::fs::write(&path, bytes).await.map_err(CodecError::from)?;

        let elapsed_ms = timer.finish_with_status(true);
        info!(
            path = %path.display(),
            customers = data.customers.len(),
            follow_ups = data.follow_ups.len(),
            elapsed_ms = elapsed_ms as u64,
            "Exported data"
        );
        Ok(path)
    }

    async fn import_data(&self, path: &Path) -> ServiceResult<ImportSummary> {
        let timer = Timer::new("import");
        let format = InterchangeFormat::from_path(path)?;
        let bytes = tokio::fs::read(path).await.map_err(CodecError::from)?;
        debug!(path = %path.display(), %format, bytes = bytes.len(), "Read import file");

        let report = codec::decode(&bytes, format, self.clock.now_millis())?;

        self.customers.upsert_all(&report.data.customers).await?;
        self.follow_ups.upsert_all(&report.data.follow_ups).await?;
        self.metrics
            .track_import(report.imported_rows(), report.skipped.len());

        let summary = ImportSummary::from(&report);
        let elapsed_ms = timer.finish_with_status(true);
        info!(
            path = %path.display(),
            customers = summary.customers,
            follow_ups = summary.follow_ups,
            skipped = summary.skipped.len(),
            elapsed_ms = elapsed_ms as u64,
            "Imported data"
        );
        Ok(summary)
    }

    async fn clear_all_data(&self) -> ServiceResult<()> {
        self.follow_ups.clear().await?;
        self.customers.clear().await?;
        info!("Cleared all customers and follow-ups");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::reminders::{ReminderEvaluator, TracingNotifier};
    use crate::repositories::LocalStore;
    use crate::scheduler::TokioJobScheduler;

    fn service(store: &LocalStore, jobs: Arc<TokioJobScheduler>) -> SettingsServiceImpl {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::at(2026, 10, 19, 8, 0, 0).unwrap());
        let metrics = MetricsTracker::new();
        let customers: Arc<dyn CustomerRepository> = Arc::new(store.clone());
        let evaluator = Arc::new(ReminderEvaluator::new(
            customers.clone(),
            Arc::new(TracingNotifier),
            clock.clone(),
            metrics.clone(),
        ));
        let scheduler = Arc::new(NotificationScheduler::new(
            jobs,
            evaluator,
            clock.clone(),
            metrics.clone(),
        ));
        SettingsServiceImpl::new(
            customers,
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            scheduler,
            clock,
            metrics,
        )
    }

    #[tokio::test]
    async fn test_defaults_then_add_registers_both() {
        let store = LocalStore::in_memory();
        let jobs = Arc::new(TokioJobScheduler::new());
        let svc = service(&store, jobs.clone());

        assert_eq!(svc.restore_schedule().await.unwrap(), 1);
        svc.add_notification_time(18, 30).await.unwrap();

        assert_eq!(svc.notification_times().await.unwrap().len(), 2);
        assert_eq!(jobs.active_jobs(), 2);
    }

    #[tokio::test]
    async fn test_disable_and_remove() {
        let store = LocalStore::in_memory();
        let jobs = Arc::new(TokioJobScheduler::new());
        let svc = service(&store, jobs.clone());

        let evening = svc.add_notification_time(18, 0).await.unwrap();
        assert_eq!(jobs.active_jobs(), 2);

        svc.set_notification_enabled(&evening.id, false).await.unwrap();
        assert_eq!(jobs.active_jobs(), 1);

        svc.remove_notification_time(&evening.id).await.unwrap();
        assert_eq!(svc.notification_times().await.unwrap().len(), 1);
        assert!(matches!(
            svc.remove_notification_time(&evening.id).await,
            Err(ServiceError::Store(StoreError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_invalid_time_rejected_before_saving() {
        let store = LocalStore::in_memory();
        let svc = service(&store, Arc::new(TokioJobScheduler::new()));

        assert!(matches!(
            svc.add_notification_time(24, 0).await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert_eq!(svc.notification_times().await.unwrap().len(), 1);
    }
}
