#![forbid(unsafe_code)]

//! Translation between visual selection and model values.
//!
//! Single-choice controls bind one scalar; multi-choice controls bind an
//! ordered list. In both directions the binder works on identities: the
//! widget side is a set of entry positions in an [`OptionList`], the model
//! side is a [`ModelValue`].

use rustc_hash::FxHashSet;

use crate::error::ChoiceError;
use crate::key::{ModelValue, OptionKey};
use crate::options::{OptionList, SlotKind};
use crate::view::EntryKind;

/// Binder for single-choice controls.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleBinder;

impl SingleBinder {
    /// Model value submitted by selecting an entry of `kind` keyed `key`.
    ///
    /// The unknown entry cannot be selected; the empty entry submits `""`.
    pub fn to_model(kind: EntryKind, key: &OptionKey) -> Result<ModelValue, ChoiceError> {
        match kind {
            EntryKind::Unknown => Err(ChoiceError::UnknownEntrySelected),
            EntryKind::Empty => Ok(ModelValue::text("")),
            EntryKind::Candidate => Ok(ModelValue::from(key)),
        }
    }

    /// Declared entry showing `model`, or `None` when only an unknown entry
    /// could represent it.
    #[must_use]
    pub fn to_widget(model: &ModelValue, options: &OptionList) -> Option<usize> {
        if model.is_undefined() || model.is_empty_text() {
            if let Some(index) = options.empty_slot() {
                return Some(index);
            }
        }
        let key = model.option_key()?;
        options.first_candidate(key.as_str())
    }
}

/// Binder for multi-choice controls.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiBinder;

impl MultiBinder {
    /// Ordered list committed when the entries keyed `selected` (in visual
    /// order) are selected.
    ///
    /// Members of `prior` that stay selected keep their order and their
    /// original value (a `Number(1)` stays a number); newly selected keys are
    /// appended as text in visual order.
    #[must_use]
    pub fn to_model(prior: &ModelValue, selected: &[&OptionKey]) -> Vec<ModelValue> {
        let wanted: FxHashSet<&str> = selected.iter().map(|key| key.as_str()).collect();
        let mut placed: FxHashSet<String> = FxHashSet::default();
        let mut out = Vec::with_capacity(selected.len());

        for member in prior.as_list().unwrap_or_default() {
            let Some(key) = member.option_key() else {
                continue;
            };
            if wanted.contains(key.as_str()) && placed.insert(key.into_string()) {
                out.push(member.clone());
            }
        }
        for key in selected {
            if placed.insert(key.as_str().to_owned()) {
                out.push(ModelValue::from(*key));
            }
        }
        out
    }

    /// Declared entries selected by `model`, by membership only.
    ///
    /// Every occurrence of a member key is selected; members without an
    /// entry are ignored.
    #[must_use]
    pub fn to_widget(model: &ModelValue, options: &OptionList) -> Vec<usize> {
        let members: FxHashSet<OptionKey> = model
            .as_list()
            .unwrap_or_default()
            .iter()
            .filter_map(ModelValue::option_key)
            .collect();
        options
            .iter()
            .enumerate()
            .filter(|(_, slot)| {
                let key = match slot.kind {
                    SlotKind::Empty => "",
                    SlotKind::Candidate => slot.key().as_str(),
                };
                members.contains(key)
            })
            .map(|(index, _)| index)
            .collect()
    }
}
