//! Validation pipeline for field values.
//!
//! Validators run in the order they were configured and the first failure
//! wins. A validator may answer synchronously or hand back a future; the
//! pipeline awaits deferred answers one at a time before moving on.
//!
//! # Example
//!
//! ```ignore
//! use fieldstate::validation::{Validator, rules};
//!
//! let validators = vec![
//!     rules::required("Username is required"),
//!     rules::min_length(3, "Username must be at least 3 characters"),
//!     Validator::async_rule(|name: String| async move { is_available(&name).await }, "Taken"),
//! ];
//! ```

mod outcome;
pub mod pipeline;
pub mod rules;
mod validator;

pub use outcome::{Evaluation, Outcome, Validation};
pub use pipeline::{evaluate, evaluate_all};
pub use validator::Validator;
