#![forbid(unsafe_code)]

//! Render descriptors handed to the widget collaborator.

use crate::config::SelectionMode;

/// Origin of a rendered entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// The synthetic placeholder for an unmatched model value.
    Unknown,
    /// The statically declared empty entry.
    Empty,
    Candidate,
}

/// One rendered entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewEntry {
    pub kind: EntryKind,
    /// Submitted value; for the unknown entry, its placeholder text.
    pub value: String,
    pub label: String,
    pub group: Option<String>,
    pub selected: bool,
}

/// Full visual state of a choice control.
///
/// Positions in [`entries`](Self::entries) are the positions accepted by
/// [`UserSelection`](crate::UserSelection). The unknown entry, when present,
/// is always first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceView {
    pub mode: SelectionMode,
    pub entries: Vec<ViewEntry>,
}

impl ChoiceView {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Submitted values of every entry, in visual order.
    #[must_use]
    pub fn values(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.value.as_str()).collect()
    }

    /// Submitted values of the selected entries, in visual order.
    #[must_use]
    pub fn selected_values(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.selected)
            .map(|e| e.value.as_str())
            .collect()
    }

    #[must_use]
    pub fn selected_positions(&self) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.selected)
            .map(|(i, _)| i)
            .collect()
    }

    /// Position of the first entry submitting `value`.
    #[must_use]
    pub fn position_of(&self, value: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.value == value)
    }

    #[must_use]
    pub fn unknown_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.kind == EntryKind::Unknown)
            .count()
    }

    /// Labels grouped by heading, in first-seen order.
    ///
    /// Top-level entries are collected under `""`. Entries of the same group
    /// are merged even when other entries sit between them.
    #[must_use]
    pub fn grouped_labels(&self) -> Vec<(String, Vec<String>)> {
        let mut blocks: Vec<(String, Vec<String>)> = Vec::new();
        for entry in &self.entries {
            let name = entry.group.as_deref().unwrap_or("");
            match blocks.iter_mut().find(|(group, _)| group == name) {
                Some((_, labels)) => labels.push(entry.label.clone()),
                None => blocks.push((name.to_owned(), vec![entry.label.clone()])),
            }
        }
        blocks
    }
}
