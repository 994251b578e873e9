use crate::error::StoreResult;
use crate::models::*;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Repository for managing customers.
///
/// Provides abstraction over customer storage so the codec, scheduler and
/// services can run against any backing store (file, in-memory, mock).
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Retrieve a single customer by ID.
    async fn get(&self, id: &str) -> StoreResult<Customer>;

    /// All customers, ordered by promise date then name.
    async fn list(&self) -> StoreResult<Vec<Customer>>;

    /// Customers whose promise date is `date`, ordered by name.
    async fn list_for_date(&self, date: NaiveDate) -> StoreResult<Vec<Customer>>;

    /// Customers whose name or phone number contains `query` (case-insensitive).
    async fn search(&self, query: &str) -> StoreResult<Vec<Customer>>;

    /// Create a new customer. Fails if the id is taken.
    async fn create(&self, customer: &Customer) -> StoreResult<Customer>;

    /// Replace an existing customer.
    async fn update(&self, customer: &Customer) -> StoreResult<Customer>;

    /// Delete a customer. Follow-ups are not touched.
    async fn delete(&self, id: &str) -> StoreResult<()>;

    /// Insert or replace many customers at once.
    async fn upsert_all(&self, customers: &[Customer]) -> StoreResult<usize>;

    /// Delete every customer.
    async fn clear(&self) -> StoreResult<()>;
}

/// Repository for managing follow-ups.
#[async_trait]
pub trait FollowUpRepository: Send + Sync {
    /// Follow-ups for a customer, newest first.
    async fn list_for_customer(&self, customer_id: &str) -> StoreResult<Vec<FollowUp>>;

    /// Every follow-up, including ones whose customer no longer exists.
    async fn list_all(&self) -> StoreResult<Vec<FollowUp>>;

    async fn count_for_customer(&self, customer_id: &str) -> StoreResult<usize>;

    /// Create a new follow-up. Fails if the id is taken.
    async fn create(&self, follow_up: &FollowUp) -> StoreResult<FollowUp>;

    /// Replace an existing follow-up.
    async fn update(&self, follow_up: &FollowUp) -> StoreResult<FollowUp>;

    async fn delete(&self, id: &str) -> StoreResult<()>;

    /// Delete all follow-ups of a customer, returning how many went.
    async fn delete_for_customer(&self, customer_id: &str) -> StoreResult<usize>;

    /// Insert or replace many follow-ups at once.
    async fn upsert_all(&self, follow_ups: &[FollowUp]) -> StoreResult<usize>;

    /// Delete every follow-up.
    async fn clear(&self) -> StoreResult<()>;
}

/// Repository for user preferences.
#[async_trait]
pub trait PreferencesRepository: Send + Sync {
    /// Configured reminder times in insertion order.
    ///
    /// When nothing has been saved yet this is [`NotificationTime::defaults`].
    async fn notification_times(&self) -> StoreResult<Vec<NotificationTime>>;

    /// Replace the reminder time list.
    async fn set_notification_times(&self, times: &[NotificationTime]) -> StoreResult<()>;
}
