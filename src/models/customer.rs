//! Customer model representing a person who has promised a payment.

use super::FollowUp;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

fn default_true() -> bool {
    true
}

/// A customer with a promised payment date.
///
/// `id` never changes after creation. `updated_at` must strictly increase on
/// every mutation; use [`Customer::touch`] rather than assigning it directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    /// Unique, stable identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Phone number as entered
    pub phone_number: String,

    /// Amount owed
    pub amount: f64,

    /// Date the customer committed to pay
    pub promise_date: NaiveDate,

    /// Free-text notes
    #[serde(default)]
    pub notes: String,

    #[serde(default = "default_true")]
    pub name_editable: bool,

    #[serde(default = "default_true")]
    pub phone_editable: bool,

    #[serde(default = "default_true")]
    pub amount_editable: bool,

    /// Creation time (epoch milliseconds)
    pub created_at: i64,

    /// Last modification time (epoch milliseconds)
    pub updated_at: i64,
}

impl Customer {
    /// Create a new customer with a fresh id, all fields editable.
    pub fn new(
        name: impl Into<String>,
        phone_number: impl Into<String>,
        amount: f64,
        promise_date: NaiveDate,
        created_at: i64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            phone_number: phone_number.into(),
            amount,
            promise_date,
            notes: String::new(),
            name_editable: true,
            phone_editable: true,
            amount_editable: true,
            created_at,
            updated_at: created_at,
        }
    }

    /// Record a mutation at `now_ms`.
    ///
    /// The stored timestamp always moves forward, even if the clock went back.
    pub fn touch(&mut self, now_ms: i64) {
        self.updated_at = now_ms.max(self.updated_at + 1);
    }

    /// Whether the promise falls on `date`.
    pub fn is_due_on(&self, date: NaiveDate) -> bool {
        self.promise_date == date
    }
}

/// How many times a customer has been chased, bucketed for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FollowUpStatus {
    /// 0-5 follow-ups
    Low,
    /// 6-10 follow-ups
    Medium,
    /// 11-20 follow-ups
    High,
    /// More than 20 follow-ups
    Critical,
}

impl FollowUpStatus {
    pub fn from_count(count: usize) -> Self {
        match count {
            0..=5 => FollowUpStatus::Low,
            6..=10 => FollowUpStatus::Medium,
            11..=20 => FollowUpStatus::High,
            _ => FollowUpStatus::Critical,
        }
    }
}

/// A customer together with their logged calls.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerWithFollowUps {
    pub customer: Customer,
    pub follow_ups: Vec<FollowUp>,
}

impl CustomerWithFollowUps {
    pub fn follow_up_count(&self) -> usize {
        self.follow_ups.len()
    }

    pub fn status(&self) -> FollowUpStatus {
        FollowUpStatus::from_count(self.follow_up_count())
    }
}

/// Orderings offered for the customer list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOption {
    /// Promise date ascending, then name
    #[default]
    Date,
    /// Name ascending
    Name,
    /// Amount descending
    Amount,
    /// Follow-up count descending
    FollowUpCount,
}

impl SortOption {
    pub fn display_name(&self) -> &'static str {
        match self {
            SortOption::Date => "Date-wise",
            SortOption::Name => "Alphabetical",
            SortOption::Amount => "Amount",
            SortOption::FollowUpCount => "Follow-up Count",
        }
    }

    /// Sort customers in place according to this option.
    pub fn sort(&self, customers: &mut [CustomerWithFollowUps]) {
        match self {
            SortOption::Date => customers.sort_by(|a, b| {
                a.customer
                    .promise_date
                    .cmp(&b.customer.promise_date)
                    .then_with(|| a.customer.name.cmp(&b.customer.name))
            }),
            SortOption::Name => customers.sort_by(|a, b| a.customer.name.cmp(&b.customer.name)),
            SortOption::Amount => customers.sort_by(|a, b| {
                b.customer
                    .amount
                    .partial_cmp(&a.customer.amount)
                    .unwrap_or(Ordering::Equal)
            }),
            SortOption::FollowUpCount => {
                customers.sort_by_key(|c| std::cmp::Reverse(c.follow_up_count()))
            }
        }
    }
}

impl FromStr for SortOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "date" => Ok(SortOption::Date),
            "name" => Ok(SortOption::Name),
            "amount" => Ok(SortOption::Amount),
            "followups" | "follow-ups" | "follow_up_count" => Ok(SortOption::FollowUpCount),
            other => Err(format!("Unknown sort option: {}", other)),
        }
    }
}
