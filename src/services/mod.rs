//! Application service layer.
//!
//! Services contain business logic and orchestrate interactions between
//! repositories, the codec and the reminder scheduler. They are the boundary
//! the command line front end talks to.

mod customer_service;
mod settings_service;

pub use customer_service::{CustomerService, CustomerServiceImpl, NewCustomer};
pub use settings_service::{ImportSummary, SettingsService, SettingsServiceImpl};
