//! The user-alert seam.

use crate::error::NotifyError;
use async_trait::async_trait;

/// A user-visible alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub body: String,
    /// Number of customers the alert is about
    pub count: usize,
}

impl Alert {
    /// The daily "customers to call" alert.
    pub fn calls_due(count: usize) -> Self {
        let noun = if count == 1 { "customer" } else { "customers" };
        Self {
            title: "Payment follow-ups due".to_string(),
            body: format!("You have {} {} to call today", count, noun),
            count,
        }
    }
}

/// Something that can put an alert in front of the user.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn show(&self, alert: &Alert) -> Result<(), NotifyError>;
}

/// Writes alerts to the log. Used by the command line front end.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn show(&self, alert: &Alert) -> Result<(), NotifyError> {
        tracing::info!(title = %alert.title, count = alert.count, "{}", alert.body);
        Ok(())
    }
}
