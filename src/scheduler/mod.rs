//! Daily reminder scheduling.
//!
//! - **delay**: next fire time and initial delay for a time of day
//! - **jobs**: the job-scheduling seam and its tokio implementation
//! - **notifications**: keeps exactly one job per enabled reminder time

pub mod delay;
pub mod jobs;
pub mod notifications;

pub use delay::{compute_initial_delay, next_fire_time};
pub use jobs::{JobAction, JobScheduler, PeriodicJob, TokioJobScheduler};
pub use notifications::{entry_tag, NotificationScheduler, REMINDER_PERIOD, REMINDER_TAG};
