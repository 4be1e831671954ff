/// Immutable view of a field, handed to renderers and listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSnapshot<V> {
    /// Current value.
    pub value: V,
    /// Error from the most recently applied validation pass (None = valid).
    pub error: Option<String>,
    /// The value differs from the field's initial value.
    pub dirty: bool,
    /// The field received a blur/commit signal.
    pub touched: bool,
    /// An asynchronous validation pass for the current value is outstanding.
    pub validating: bool,
    /// At least one validation pass has been applied since creation or reset.
    pub has_been_validated: bool,
}

impl<V> FieldSnapshot<V> {
    /// Check if the snapshot carries an error.
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

/// A value change reported to `on_did_change` hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueChange<V> {
    pub old: V,
    pub new: V,
}
