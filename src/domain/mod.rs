//! Domain value objects and helpers.
//!
//! Type-safe phone numbers validated at construction time, calendar helpers
//! for promise dates, and the validation error they share.

pub mod calendar;
pub mod errors;
pub mod phone;

pub use calendar::{days_between, relative_label};
pub use errors::ValidationError;
pub use phone::PhoneNumber;
