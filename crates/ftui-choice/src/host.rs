#![forbid(unsafe_code)]

//! Outbound seam to the widget and model collaborators.

use crate::key::ModelValue;
use crate::view::ChoiceView;

/// Receives the outward effects of a reconciliation pass.
///
/// Each pass calls [`render`](Self::render) and [`commit`](Self::commit) at
/// most once, and only after the control's internal state is consistent.
pub trait ChoiceHost {
    /// Redraw the widget. Idempotent; also responsible for clearing any
    /// previously selected visual state.
    fn render(&mut self, view: &ChoiceView);

    /// Write a new value to the bound model.
    fn commit(&mut self, value: &ModelValue);
}

/// A host that records every call, for tests and headless use.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    pub renders: Vec<ChoiceView>,
    pub commits: Vec<ModelValue>,
}

impl RecordingHost {
    #[must_use]
    pub fn render_count(&self) -> usize {
        self.renders.len()
    }

    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.commits.len()
    }

    #[must_use]
    pub fn last_render(&self) -> Option<&ChoiceView> {
        self.renders.last()
    }

    #[must_use]
    pub fn last_commit(&self) -> Option<&ModelValue> {
        self.commits.last()
    }

    pub fn clear(&mut self) {
        self.renders.clear();
        self.commits.clear();
    }
}

impl ChoiceHost for RecordingHost {
    fn render(&mut self, view: &ChoiceView) {
        self.renders.push(view.clone());
    }

    fn commit(&mut self, value: &ModelValue) {
        self.commits.push(value.clone());
    }
}
