#![forbid(unsafe_code)]

//! Errors surfaced by choice reconciliation.
//!
//! Only configuration problems and invalid user selections leave the core.
//! Everything else (untracked removals, unmatched model values) is absorbed
//! and resolved into a well-defined unknown/empty state.

use crate::config::SelectionMode;

/// Errors returned by [`ChoiceReconciler`](crate::ChoiceReconciler) passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceError {
    /// A candidate value collides with a reserved registry key.
    ///
    /// The pass that carried it is rejected before any state changes.
    ReservedKey { key: String },
    /// A user pass tried to select the synthetic unknown entry.
    UnknownEntrySelected,
    /// A user pass addressed a position with no entry.
    SelectionOutOfRange { position: usize, len: usize },
    /// A user selection of the wrong arity for the control's mode.
    ModeMismatch { expected: SelectionMode },
}

impl ChoiceError {
    /// Whether this is a configuration error (fatal to the caller).
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::ReservedKey { .. })
    }
}

impl std::fmt::Display for ChoiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReservedKey { key } => {
                write!(f, "{key} is not a valid \"option value\" name")
            }
            Self::UnknownEntrySelected => {
                write!(f, "the unknown entry cannot be selected")
            }
            Self::SelectionOutOfRange { position, len } => {
                write!(f, "selection position {position} out of range (len={len})")
            }
            Self::ModeMismatch { expected } => {
                write!(f, "selection does not match {expected:?} mode")
            }
        }
    }
}

impl std::error::Error for ChoiceError {}
