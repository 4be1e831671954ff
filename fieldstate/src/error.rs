//! Error types for field state.

use std::any::Any;

use thiserror::Error;

/// Error message recorded when a validator faults instead of reporting an outcome.
pub const VALIDATION_FAILED_MESSAGE: &str = "validation failed";

/// Errors surfaced by field state operations.
///
/// Validation failures are never reported through this type; they live in the
/// field's `error` slot. This only covers misuse of the field itself.
#[derive(Debug, Error)]
pub enum FieldStateError {
    /// The field was disposed and no longer accepts work.
    #[error("field state has been disposed")]
    Disposed,

    /// A pattern validator was built from a malformed regular expression.
    #[error("invalid validation pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Extract a human-readable message from a panic payload.
///
/// Panics carry either `&str` or `String` payloads; anything else falls back
/// to a generic message.
pub fn extract_panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
