//! The field state container and its notification plumbing.

mod config;
mod listeners;
mod snapshot;
mod state;

pub use config::FieldConfig;
pub use listeners::SubscriptionId;
pub use snapshot::{FieldSnapshot, ValueChange};
pub use state::FieldState;
