use std::fmt;

use futures::future::BoxFuture;

/// What a single validator reports for a value.
pub enum Outcome {
    /// The value passed this validator.
    Valid,
    /// The value failed with a human-readable reason.
    Invalid(String),
    /// The answer is deferred. Resolves to `None` when valid, `Some(reason)` otherwise.
    Pending(BoxFuture<'static, Option<String>>),
}

impl From<Option<String>> for Outcome {
    fn from(error: Option<String>) -> Self {
        match error {
            Some(message) => Self::Invalid(message),
            None => Self::Valid,
        }
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => f.write_str("Valid"),
            Self::Invalid(message) => f.debug_tuple("Invalid").field(message).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// Result of running a whole validator list over one value.
pub enum Evaluation {
    /// Every validator passed.
    Valid,
    /// A validator failed synchronously; later validators did not run.
    Invalid(String),
    /// An asynchronous validator is outstanding. The future finishes the rest
    /// of the list and resolves to the first failure, if any.
    Pending(BoxFuture<'static, Option<String>>),
}

impl Evaluation {
    /// Check if the evaluation finished without a failure.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Check if the evaluation is still waiting on a deferred validator.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

impl fmt::Debug for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => f.write_str("Valid"),
            Self::Invalid(message) => f.debug_tuple("Invalid").field(message).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// Outcome of an explicit `FieldState::validate` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation<V> {
    /// The field is valid; carries the value that was validated.
    Valid(V),
    /// The field is invalid.
    Invalid(String),
}

impl<V> Validation<V> {
    /// Check if the field failed validation.
    pub fn has_error(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }

    /// Get the validated value, if the field passed.
    pub fn value(&self) -> Option<&V> {
        match self {
            Self::Valid(value) => Some(value),
            Self::Invalid(_) => None,
        }
    }

    /// Get the error message, if the field failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Valid(_) => None,
            Self::Invalid(message) => Some(message),
        }
    }
}
