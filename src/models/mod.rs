//! Data models for the follow-up tracker.
//!
//! Customers with a promised payment date, the follow-up calls logged against
//! them, the daily reminder times, and the transient export bundle.

pub mod customer;
pub mod export_data;
pub mod follow_up;
pub mod notification_time;

pub use customer::{Customer, CustomerWithFollowUps, FollowUpStatus, SortOption};
pub use export_data::ExportData;
pub use follow_up::FollowUp;
pub use notification_time::NotificationTime;
