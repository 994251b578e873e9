//! What happens when a reminder fires.

mod evaluator;
mod notifier;

pub use evaluator::{FireOutcome, ReminderEvaluator};
pub use notifier::{Alert, Notifier, TracingNotifier};
