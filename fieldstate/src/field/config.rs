//! Field configuration.

use std::time::Duration;

/// Per-field configuration.
///
/// Controls when a field validates on its own. Explicit `validate()` calls are
/// unaffected by either setting.
#[derive(Debug, Clone)]
pub struct FieldConfig {
    /// Validate automatically on every value change.
    pub auto_validation: bool,

    /// Wait this long after the last change before validating (None = validate
    /// synchronously inside `set_value`). Needs a tokio runtime; without one
    /// the field validates immediately.
    pub debounce: Option<Duration>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            auto_validation: true,
            debounce: None,
        }
    }
}

impl FieldConfig {
    /// Create the default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Debounce automatic validation.
    pub fn debounce(mut self, delay: Duration) -> Self {
        self.debounce = Some(delay);
        self
    }

    /// Only validate when `validate()` is called.
    pub fn manual_validation(mut self) -> Self {
        self.auto_validation = false;
        self
    }
}
