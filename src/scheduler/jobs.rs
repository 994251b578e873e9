//! Periodic job registration.
//!
//! [`JobScheduler`] is the seam to whatever runs background work (an OS job
//! service, a test fake). [`TokioJobScheduler`] runs each job on its own
//! tokio task: sleep until the first fire, then tick once per period.

use crate::error::{SchedulerError, SchedulerResult};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Work performed on every fire. Each call produces a fresh future.
pub type JobAction = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// A recurring job as handed to the scheduling facility.
#[derive(Clone)]
pub struct PeriodicJob {
    /// Human-readable name for logs
    pub name: String,
    /// Wait before the first fire
    pub initial_delay: Duration,
    /// Interval between fires
    pub period: Duration,
    /// Tags used to cancel groups of jobs
    pub tags: Vec<String>,
    pub action: JobAction,
}

impl PeriodicJob {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

impl fmt::Debug for PeriodicJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeriodicJob")
            .field("name", &self.name)
            .field("initial_delay", &self.initial_delay)
            .field("period", &self.period)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

/// A facility that runs periodic jobs and cancels them by tag.
#[async_trait]
pub trait JobScheduler: Send + Sync {
    /// Start running `job` after its initial delay, then every period.
    async fn register(&self, job: PeriodicJob) -> SchedulerResult<()>;

    /// Stop every job carrying `tag`. Returns how many were stopped;
    /// zero when nothing matched.
    async fn cancel_by_tag(&self, tag: &str) -> usize;
}

struct RunningJob {
    name: String,
    tags: Vec<String>,
    handle: JoinHandle<()>,
}

/// Runs jobs as tokio tasks in the current runtime.
///
/// Every fire is spawned separately, so a slow or hung fire never holds up
/// the next tick. Dropping the scheduler stops all of its jobs.
#[derive(Default)]
pub struct TokioJobScheduler {
    jobs: Mutex<Vec<RunningJob>>,
}

impl TokioJobScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of jobs currently registered.
    pub fn active_jobs(&self) -> usize {
        self.jobs
            .lock()
            .map(|jobs| jobs.iter().filter(|j| !j.handle.is_finished()).count())
            .unwrap_or(0)
    }

    /// Names of the registered jobs, in registration order.
    pub fn job_names(&self) -> Vec<String> {
        self.jobs
            .lock()
            .map(|jobs| jobs.iter().map(|j| j.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Stop every job.
    pub fn shutdown(&self) {
        if let Ok(mut jobs) = self.jobs.lock() {
            for job in jobs.drain(..) {
                job.handle.abort();
            }
        }
    }
}

impl Drop for TokioJobScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn drive(name: String, initial_delay: Duration, period: Duration, action: JobAction) {
    let mut ticker = tokio::time::interval_at(Instant::now() + initial_delay, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        debug!(job = %name, "Job fired");
        tokio::spawn((action)());
    }
}

#[async_trait]
impl JobScheduler for TokioJobScheduler {
    async fn register(&self, job: PeriodicJob) -> SchedulerResult<()> {
        if job.period.is_zero() {
            return Err(SchedulerError::Registration {
                id: job.name,
                reason: "period must be non-zero".to_string(),
            });
        }

        let mut jobs = self
            .jobs
            .lock()
            .map_err(|_| SchedulerError::Unavailable("job table poisoned".to_string()))?;
        jobs.retain(|j| !j.handle.is_finished());

        info!(
            job = %job.name,
            initial_delay_ms = job.initial_delay.as_millis() as u64,
            period_secs = job.period.as_secs(),
            "Registering periodic job"
        );

        let handle = tokio::spawn(drive(
            job.name.clone(),
            job.initial_delay,
            job.period,
            job.action,
        ));
        jobs.push(RunningJob {
            name: job.name,
            tags: job.tags,
            handle,
        });
        Ok(())
    }

    async fn cancel_by_tag(&self, tag: &str) -> usize {
        let Ok(mut jobs) = self.jobs.lock() else {
            return 0;
        };

        let mut cancelled = 0;
        jobs.retain(|job| {
            if job.tags.iter().any(|t| t == tag) {
                job.handle.abort();
                cancelled += 1;
                false
            } else {
                true
            }
        });

        debug!(tag = %tag, cancelled, "Cancelled jobs by tag");
        cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_job(name: &str, tags: &[&str], counter: Arc<AtomicUsize>) -> PeriodicJob {
        PeriodicJob {
            name: name.to_string(),
            initial_delay: Duration::from_millis(100),
            period: Duration::from_secs(60),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            action: Arc::new(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
                .boxed()
            }),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_job_fires_after_delay_then_every_period() {
        let scheduler = TokioJobScheduler::new();
        let fires = Arc::new(AtomicUsize::new(0));
        scheduler
            .register(counting_job("a", &["group"], fires.clone()))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fires.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fires.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(fires.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_by_tag_only_touches_matching_jobs() {
        let scheduler = TokioJobScheduler::new();
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));
        scheduler
            .register(counting_job("a", &["group", "a"], a.clone()))
            .await
            .unwrap();
        scheduler
            .register(counting_job("b", &["group", "b"], b.clone()))
            .await
            .unwrap();

        assert_eq!(scheduler.cancel_by_tag("a").await, 1);
        assert_eq!(scheduler.cancel_by_tag("a").await, 0);
        assert_eq!(scheduler.job_names(), vec!["b".to_string()]);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(a.load(Ordering::SeqCst), 0);
        assert_eq!(b.load(Ordering::SeqCst), 1);

        assert_eq!(scheduler.cancel_by_tag("group").await, 1);
        assert_eq!(scheduler.active_jobs(), 0);
    }

    #[tokio::test]
    async fn test_zero_period_rejected() {
        let scheduler = TokioJobScheduler::new();
        let mut job = counting_job("z", &[], Arc::new(AtomicUsize::new(0)));
        job.period = Duration::ZERO;
        assert!(matches!(
            scheduler.register(job).await,
            Err(SchedulerError::Registration { .. })
        ));
    }
}
