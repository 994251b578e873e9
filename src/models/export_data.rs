//! The bundle moved through one export or import.

use super::{Customer, FollowUp};

/// All customers and follow-ups at a point in time.
///
/// Only lives for the duration of a single export or import; never stored.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExportData {
    pub customers: Vec<Customer>,
    pub follow_ups: Vec<FollowUp>,

    /// When the bundle was assembled (epoch milliseconds)
    pub exported_at: i64,
}

impl ExportData {
    pub fn new(customers: Vec<Customer>, follow_ups: Vec<FollowUp>, exported_at: i64) -> Self {
        Self {
            customers,
            follow_ups,
            exported_at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty() && self.follow_ups.is_empty()
    }
}
