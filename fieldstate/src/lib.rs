//! Reactive, validatable single-field state for UI bindings.
//!
//! A [`FieldState`](field::FieldState) owns one form field's value, runs its
//! validators on every change and tells subscribers about each completed
//! transition. Asynchronous validators are raced by generation: only the
//! result for the latest edit is ever applied.

pub mod error;
pub mod field;
pub mod validation;
pub mod wakeup;

pub use error::{FieldStateError, VALIDATION_FAILED_MESSAGE};
pub use field::{FieldConfig, FieldSnapshot, FieldState, SubscriptionId, ValueChange};
pub use validation::{Evaluation, Outcome, Validation, Validator};

pub mod prelude {
    pub use crate::error::FieldStateError;
    pub use crate::field::{FieldConfig, FieldSnapshot, FieldState, SubscriptionId, ValueChange};
    pub use crate::validation::{Outcome, Validation, Validator, rules};
    pub use crate::wakeup::{WakeupReceiver, WakeupSender};
}
