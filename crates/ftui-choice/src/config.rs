#![forbid(unsafe_code)]

//! Choice control configuration.

/// Whether a control binds one value or an ordered list of values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SelectionMode {
    #[default]
    Single,
    Multiple,
}

impl SelectionMode {
    #[must_use]
    pub const fn is_multiple(self) -> bool {
        matches!(self, Self::Multiple)
    }
}

/// Configuration for a [`ChoiceReconciler`](crate::ChoiceReconciler).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChoiceConfig {
    /// Selection mode (default: single).
    pub mode: SelectionMode,
    /// Keys rejected at registration in addition to
    /// [`RESERVED_KEYS`](crate::key::RESERVED_KEYS) (default: none). Enforced
    /// by the control's [`OptionRegistry`](crate::OptionRegistry).
    #[cfg_attr(feature = "serde", serde(default))]
    pub extra_reserved_keys: Vec<String>,
}

impl ChoiceConfig {
    /// Single-choice configuration.
    #[must_use]
    pub fn single() -> Self {
        Self::default()
    }

    /// Multi-choice configuration.
    #[must_use]
    pub fn multiple() -> Self {
        Self::default().with_mode(SelectionMode::Multiple)
    }

    #[must_use]
    pub fn with_mode(mut self, mode: SelectionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Reject an additional key at registration.
    #[must_use]
    pub fn reserve_key(mut self, key: impl Into<String>) -> Self {
        self.extra_reserved_keys.push(key.into());
        self
    }
}
