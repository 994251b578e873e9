//! Follow-up model: one logged call or contact attempt.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A call logged against a customer.
///
/// `customer_id` is not enforced; a follow-up may outlive its customer in an
/// imported file and is kept as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FollowUp {
    pub id: String,

    /// Customer this call was made to
    pub customer_id: String,

    #[serde(default)]
    pub notes: String,

    /// When the call was logged (epoch milliseconds)
    pub timestamp: i64,

    /// New promise date agreed on the call, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_promise_date: Option<NaiveDate>,
}

impl FollowUp {
    /// Create a new follow-up with a fresh id.
    pub fn new(
        customer_id: impl Into<String>,
        notes: impl Into<String>,
        next_promise_date: Option<NaiveDate>,
        timestamp: i64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            customer_id: customer_id.into(),
            notes: notes.into(),
            timestamp,
            next_promise_date,
        }
    }
}
