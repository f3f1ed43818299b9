#![forbid(unsafe_code)]

//! Unknown and empty entry policy.
//!
//! A single-choice control must always show *something* selected. When the
//! model value matches no candidate, the manager synthesizes an unknown entry
//! carrying that value and selects it. A statically declared empty entry
//! (value `""`) stands in for an undefined model instead.
//!
//! # Single-choice policy
//!
//! | Model value | Empty entry | Result |
//! |-------------|-------------|--------|
//! | `Undefined` or `""` | declared | empty entry selected, no unknown |
//! | key registered | any | candidate selected, no unknown |
//! | anything else | any | unknown entry (re)created and selected |
//!
//! Multi-choice controls never synthesize entries: every candidate whose key
//! is a member of the bound list is selected and unmatched members are
//! ignored.
//!
//! # Invariants
//!
//! 1. At most one unknown entry exists, and only in single-choice mode.
//! 2. The unknown entry exists iff the model has no matching real or empty
//!    candidate.
//! 3. The unknown entry's content is rewritten on every resolution; it never
//!    carries a stale value.
//! 4. The unknown entry's text never equals a registered candidate key.

use crate::config::SelectionMode;
use crate::key::{self, ModelValue, OptionKey};
use crate::registry::OptionRegistry;

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// The synthetic entry shown when the model matches no candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownEntry {
    value: ModelValue,
    label: String,
}

impl UnknownEntry {
    /// Placeholder for `value`, suffixed with ` ?` until it collides with no
    /// registered candidate key.
    fn new(value: ModelValue, registry: &OptionRegistry) -> Self {
        let mut label = key::unknown_label(&value);
        while registry.exists(&label) {
            label.push_str(" ?");
        }
        Self { value, label }
    }

    /// The unmatched model value.
    #[must_use]
    pub fn value(&self) -> &ModelValue {
        &self.value
    }

    /// Placeholder text, e.g. `? string:wallee ?`. Also used as the entry's
    /// submitted value. When a candidate is keyed with the plain placeholder,
    /// ` ?` suffixes are appended until the text matches no registered key.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// The statically declared empty entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyEntry {
    label: String,
}

impl EmptyEntry {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// What a control has selected, by identity rather than position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    /// Nothing selected; only before the first resolution.
    #[default]
    None,
    Empty,
    Unknown,
    Candidate(OptionKey),
    /// Multi-choice members with a matching entry, sorted and deduplicated.
    Members(Vec<OptionKey>),
}

impl Selection {
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Whether a real (declared) entry is selected.
    #[must_use]
    pub fn is_real(&self) -> bool {
        matches!(self, Self::Empty | Self::Candidate(_))
    }
}

/// How a resolution changed the unknown entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownChange {
    Unchanged,
    Created,
    /// Rewritten with different text.
    Refreshed,
    Removed,
}

/// Result of one placeholder resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub selection: Selection,
    pub unknown: UnknownChange,
}

// ---------------------------------------------------------------------------
// PlaceholderManager
// ---------------------------------------------------------------------------

/// Owns the unknown entry and recognizes the empty entry.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderManager {
    empty: Option<EmptyEntry>,
    unknown: Option<UnknownEntry>,
}

impl PlaceholderManager {
    /// A manager whose empty entry presence is fixed for its lifetime.
    #[must_use]
    pub fn new(empty: Option<EmptyEntry>) -> Self {
        Self {
            empty,
            unknown: None,
        }
    }

    #[must_use]
    pub fn empty_entry(&self) -> Option<&EmptyEntry> {
        self.empty.as_ref()
    }

    #[must_use]
    pub fn unknown_entry(&self) -> Option<&UnknownEntry> {
        self.unknown.as_ref()
    }

    /// Whether a candidate keyed `key` exists, counting the empty entry.
    #[must_use]
    pub fn has_option(&self, registry: &OptionRegistry, key: &str) -> bool {
        registry.exists(key) || (key.is_empty() && self.empty.is_some())
    }

    /// Resolve the selection after the model value changed.
    pub fn reconcile_after_model_change(
        &mut self,
        model: &ModelValue,
        registry: &OptionRegistry,
        mode: SelectionMode,
    ) -> Resolution {
        let resolution = self.resolve(model, registry, mode);
        #[cfg(feature = "tracing")]
        tracing::trace!(
            trigger = "model",
            selection = ?resolution.selection,
            unknown = ?resolution.unknown,
            "placeholder resolved"
        );
        resolution
    }

    /// Resolve the selection after candidates were added, removed or moved.
    pub fn reconcile_after_structural_change(
        &mut self,
        model: &ModelValue,
        registry: &OptionRegistry,
        mode: SelectionMode,
    ) -> Resolution {
        let resolution = self.resolve(model, registry, mode);
        #[cfg(feature = "tracing")]
        tracing::trace!(
            trigger = "structure",
            selection = ?resolution.selection,
            unknown = ?resolution.unknown,
            "placeholder resolved"
        );
        resolution
    }

    fn resolve(
        &mut self,
        model: &ModelValue,
        registry: &OptionRegistry,
        mode: SelectionMode,
    ) -> Resolution {
        let selection = match mode {
            SelectionMode::Multiple => self.members(model, registry),
            SelectionMode::Single => self.single_target(model, registry),
        };

        let unknown = if selection.is_unknown() {
            let fresh = UnknownEntry::new(model.clone(), registry);
            let change = match &self.unknown {
                None => UnknownChange::Created,
                Some(current) if current.label != fresh.label => UnknownChange::Refreshed,
                Some(_) => UnknownChange::Unchanged,
            };
            self.unknown = Some(fresh);
            change
        } else if self.unknown.take().is_some() {
            UnknownChange::Removed
        } else {
            UnknownChange::Unchanged
        };

        Resolution { selection, unknown }
    }

    fn single_target(&self, model: &ModelValue, registry: &OptionRegistry) -> Selection {
        if self.empty.is_some() && (model.is_undefined() || model.is_empty_text()) {
            return Selection::Empty;
        }
        match model.option_key() {
            Some(key) if registry.exists(key.as_str()) => Selection::Candidate(key),
            _ => Selection::Unknown,
        }
    }

    fn members(&self, model: &ModelValue, registry: &OptionRegistry) -> Selection {
        let mut keys: Vec<OptionKey> = model
            .as_list()
            .unwrap_or_default()
            .iter()
            .filter_map(ModelValue::option_key)
            .filter(|key| self.has_option(registry, key.as_str()))
            .collect();
        keys.sort();
        keys.dedup();
        Selection::Members(keys)
    }
}
