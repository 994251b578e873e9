use async_trait::async_trait;
use followup_tracker::error::{SchedulerError, SchedulerResult};
use followup_tracker::scheduler::{JobScheduler, PeriodicJob};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Mock job scheduler for testing.
///
/// Records registered jobs instead of running them. Jobs can be fired by hand
/// with [`MockJobScheduler::fire`], and a registration can be made to fail.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct MockJobScheduler {
    jobs: Arc<Mutex<Vec<PeriodicJob>>>,
    registrations: Arc<Mutex<usize>>,
    fail_on: Arc<Mutex<Option<usize>>>,
    events: Arc<Mutex<Vec<String>>>,
    yield_on_register: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl MockJobScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `n`th registration from now on (1-based).
    pub fn fail_on_registration(&self, n: usize) {
        *self.registrations.lock().unwrap() = 0;
        *self.fail_on.lock().unwrap() = Some(n);
    }

    /// Give up the task once inside every `register` call.
    pub fn yield_on_register(&self, enabled: bool) {
        self.yield_on_register.store(enabled, Ordering::SeqCst);
    }

    /// Calls in the order they happened: `cancel <tag>` or `register <name>`.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    pub fn jobs_with_tag(&self, tag: &str) -> usize {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|j| j.has_tag(tag))
            .count()
    }

    pub fn names(&self) -> Vec<String> {
        self.jobs.lock().unwrap().iter().map(|j| j.name.clone()).collect()
    }

    /// (initial delay, period) of every registered job.
    pub fn timings(&self) -> Vec<(std::time::Duration, std::time::Duration)> {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .map(|j| (j.initial_delay, j.period))
            .collect()
    }

    /// Run the action of the job at `index` once.
    pub async fn fire(&self, index: usize) {
        let action = self.jobs.lock().unwrap()[index].action.clone();
        (action)().await;
    }
}

#[async_trait]
impl JobScheduler for MockJobScheduler {
    async fn register(&self, job: PeriodicJob) -> SchedulerResult<()> {
        if self.yield_on_register.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        self.events.lock().unwrap().push(format!("register {}", job.name));

        let attempt = {
            let mut count = self.registrations.lock().unwrap();
            *count += 1;
            *count
        };

        if *self.fail_on.lock().unwrap() == Some(attempt) {
            return Err(SchedulerError::Registration {
                id: job.name,
                reason: "mock refused registration".to_string(),
            });
        }

        self.jobs.lock().unwrap().push(job);
        Ok(())
    }

    async fn cancel_by_tag(&self, tag: &str) -> usize {
        self.events.lock().unwrap().push(format!("cancel {}", tag));
        let mut jobs = self.jobs.lock().unwrap();
        let before = jobs.len();
        jobs.retain(|j| !j.has_tag(tag));
        before - jobs.len()
    }
}
