use async_trait::async_trait;
use followup_tracker::error::NotifyError;
use followup_tracker::reminders::{Alert, Notifier};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Mock notifier that remembers every alert it was asked to show.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct MockNotifier {
    shown: Arc<Mutex<Vec<Alert>>>,
    failing: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.shown.lock().unwrap().clone()
    }

    pub fn alert_count(&self) -> usize {
        self.shown.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn show(&self, alert: &Alert) -> Result<(), NotifyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError("notifications disabled".to_string()));
        }
        self.shown.lock().unwrap().push(alert.clone());
        Ok(())
    }
}
