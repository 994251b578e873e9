//! Followup Tracker - customer payment follow-ups with daily call reminders.
//!
//! Tracks customers who promised to pay on a given date, the calls made to
//! them, and raises one alert per configured time of day when somebody is due.
//! All records can be exported to and imported from CSV or Excel files.
//!
//! # Architecture
//!
//! - **models**: Customers, follow-ups, reminder times and the export bundle
//! - **domain**: Phone number and calendar helpers
//! - **error**: Custom error types for precise error handling
//! - **config**: Configuration management from environment variables
//! - **clock**: Injectable wall clock
//! - **codec**: CSV and Excel export/import
//! - **repositories**: Storage traits and the JSON-backed local store
//! - **reminders**: Due-today evaluation and alert delivery
//! - **scheduler**: Daily recurring jobs, one per enabled reminder time
//! - **services**: Business operations used by the command line front end
//! - **observability**: Counters for fires, alerts and imports

pub mod clock;
pub mod codec;
pub mod config;
pub mod domain;
pub mod error;
pub mod models;
pub mod observability;
pub mod reminders;
pub mod repositories;
pub mod scheduler;
pub mod services;

// Re-export commonly used types
pub use clock::{Clock, FixedClock, SystemClock};
pub use codec::{ImportReport, InterchangeFormat, SkippedRow};
pub use config::Config;
pub use error::{
    CodecError, ConfigError, EvaluationError, NotifyError, RowParseError, SchedulerError,
    ServiceError, StoreError,
};
pub use models::{
    Customer, CustomerWithFollowUps, ExportData, FollowUp, FollowUpStatus, NotificationTime,
    SortOption,
};
pub use observability::MetricsTracker;
pub use reminders::{Alert, FireOutcome, Notifier, ReminderEvaluator, TracingNotifier};
pub use repositories::LocalStore;
pub use scheduler::{JobScheduler, NotificationScheduler, PeriodicJob, TokioJobScheduler};
pub use services::{
    CustomerService, CustomerServiceImpl, ImportSummary, NewCustomer, SettingsService,
    SettingsServiceImpl,
};
