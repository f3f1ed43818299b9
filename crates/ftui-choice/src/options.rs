#![forbid(unsafe_code)]

//! Ordered declared entries of a choice control.
//!
//! The list holds every declared entry in visual order: statically declared
//! candidates, the empty entry (if any) and repeated candidates. The
//! synthetic unknown entry is not part of it. Structural instructions are
//! applied here one by one; the registry and group tracker are updated from
//! the outcome.

use crate::change::Candidate;
use crate::key::OptionKey;

/// Kind of a declared entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// The statically declared empty entry. Never touched by instructions.
    Empty,
    Candidate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub kind: SlotKind,
    pub candidate: Candidate,
}

impl Slot {
    #[must_use]
    pub fn key(&self) -> &OptionKey {
        self.candidate.value()
    }

    #[must_use]
    pub fn is_candidate(&self) -> bool {
        self.kind == SlotKind::Candidate
    }
}

/// Declared entries in visual order.
#[derive(Debug, Clone, Default)]
pub struct OptionList {
    slots: Vec<Slot>,
}

impl OptionList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Slot> {
        self.slots.iter()
    }

    /// Candidate occurrences as `(key, group)`, in visual order.
    pub fn layout(&self) -> impl Iterator<Item = (&OptionKey, Option<&str>)> {
        self.slots
            .iter()
            .filter(|slot| slot.is_candidate())
            .map(|slot| (slot.key(), slot.candidate.group()))
    }

    /// Index of the empty entry.
    #[must_use]
    pub fn empty_slot(&self) -> Option<usize> {
        self.slots.iter().position(|slot| slot.kind == SlotKind::Empty)
    }

    /// Index of the first candidate occurrence of `key`.
    #[must_use]
    pub fn first_candidate(&self, key: &str) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.is_candidate() && slot.key().as_str() == key)
    }

    /// Resolve an occurrence: the hinted slot if it holds `key`, otherwise
    /// the first occurrence.
    pub(crate) fn locate(&self, key: &OptionKey, hint: Option<usize>) -> Option<usize> {
        hint.filter(|&index| {
            self.slots
                .get(index)
                .is_some_and(|slot| slot.is_candidate() && slot.key() == key)
        })
        .or_else(|| self.first_candidate(key.as_str()))
    }

    /// Insert a slot at `position` (clamped), returning where it landed.
    pub fn insert(&mut self, slot: Slot, position: usize) -> usize {
        let at = position.min(self.slots.len());
        self.slots.insert(at, slot);
        at
    }

    pub fn remove(&mut self, key: &OptionKey, hint: Option<usize>) -> Option<Slot> {
        let index = self.locate(key, hint)?;
        Some(self.slots.remove(index))
    }

    /// Move an occurrence of `key` to `position` under `group`.
    ///
    /// Returns the final index.
    pub fn relocate(
        &mut self,
        key: &OptionKey,
        group: Option<String>,
        position: usize,
        hint: Option<usize>,
    ) -> Option<usize> {
        let index = self.locate(key, hint)?;
        let mut slot = self.slots.remove(index);
        slot.candidate.set_group(group);
        Some(self.insert(slot, position))
    }

    /// Rewrite an occurrence of `old` in place, returning its index and the
    /// candidate it held.
    pub fn replace(
        &mut self,
        old: &OptionKey,
        candidate: Candidate,
        hint: Option<usize>,
    ) -> Option<(usize, Candidate)> {
        let index = self.locate(old, hint)?;
        let previous = std::mem::replace(&mut self.slots[index].candidate, candidate);
        Some((index, previous))
    }
}
