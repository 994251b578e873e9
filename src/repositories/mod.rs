//! Storage traits and the local JSON-backed store.

mod local_store;
mod traits;

pub use local_store::LocalStore;
pub use traits::{CustomerRepository, FollowUpRepository, PreferencesRepository};
