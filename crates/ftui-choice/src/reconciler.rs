#![forbid(unsafe_code)]

//! Reconciliation passes for a choice control.
//!
//! [`ChoiceReconciler`] owns the declared entries, the option registry, the
//! group tracker and the placeholder manager of one control, plus its copy of
//! the bound model value. Three kinds of pass bring them back into agreement:
//!
//! | Pass | Trigger | Render | Commit |
//! |------|---------|--------|--------|
//! | structural | [`apply_changes`](ChoiceReconciler::apply_changes) | when the visual selection or the entry showing it changed | when unknown ↔ real match flipped |
//! | model | [`set_model`](ChoiceReconciler::set_model) | exactly once | never |
//! | user | [`select_by_user`](ChoiceReconciler::select_by_user) | when the unknown entry went away | exactly once |
//!
//! # Ordering
//!
//! Within a pass, structural instructions are fully applied to the entry
//! list, registry and group tracker before the placeholder manager runs, and
//! its decision is applied before the host sees any call. Each pass calls
//! [`ChoiceHost::commit`] and [`ChoiceHost::render`] at most once, in that
//! order.
//!
//! # Failure Modes
//!
//! | Failure | Handling |
//! |---------|----------|
//! | Reserved candidate value | Pass rejected before any mutation |
//! | Remove/move/replace of an absent key | Ignored |
//! | Model value without a candidate | Unknown entry (single) or ignored (multi) |
//! | User selects the unknown entry | [`ChoiceError::UnknownEntrySelected`] |

use bitflags::bitflags;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::binder::{MultiBinder, SingleBinder};
use crate::change::{Candidate, Change, ChangeSet};
use crate::config::{ChoiceConfig, SelectionMode};
use crate::error::ChoiceError;
use crate::group::{GroupMove, GroupTracker};
use crate::host::ChoiceHost;
use crate::key::{ModelValue, OptionKey};
use crate::options::{OptionList, Slot, SlotKind};
use crate::placeholder::{EmptyEntry, PlaceholderManager, Selection, UnknownChange, UnknownEntry};
use crate::registry::OptionRegistry;
use crate::view::{ChoiceView, EntryKind, ViewEntry};

// ---------------------------------------------------------------------------
// Pass reports
// ---------------------------------------------------------------------------

bitflags! {
    /// What a pass did.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PassFlags: u8 {
        /// The host was asked to render.
        const RENDERED          = 0b0000_0001;
        /// The host was asked to commit a model value.
        const COMMITTED         = 0b0000_0010;
        /// The selected identity changed.
        const SELECTION_CHANGED = 0b0000_0100;
        const UNKNOWN_CREATED   = 0b0000_1000;
        const UNKNOWN_REMOVED   = 0b0001_0000;
        /// The unknown entry now carries a different value.
        const UNKNOWN_REFRESHED = 0b0010_0000;
    }
}

impl PassFlags {
    fn from_unknown(change: UnknownChange) -> Self {
        match change {
            UnknownChange::Unchanged => Self::empty(),
            UnknownChange::Created => Self::UNKNOWN_CREATED,
            UnknownChange::Refreshed => Self::UNKNOWN_REFRESHED,
            UnknownChange::Removed => Self::UNKNOWN_REMOVED,
        }
    }

    fn visual(self) -> bool {
        self.intersects(
            Self::SELECTION_CHANGED
                | Self::UNKNOWN_CREATED
                | Self::UNKNOWN_REMOVED
                | Self::UNKNOWN_REFRESHED,
        )
    }
}

/// Kind of reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    Initial,
    Structural,
    Model,
    User,
}

impl PassKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Structural => "structural",
            Self::Model => "model",
            Self::User => "user",
        }
    }
}

/// Outcome of one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub kind: PassKind,
    pub flags: PassFlags,
    /// Keys whose reported group changed (structural passes only).
    pub group_moves: Vec<GroupMove>,
}

impl PassReport {
    fn new(kind: PassKind, flags: PassFlags) -> Self {
        Self {
            kind,
            flags,
            group_moves: Vec::new(),
        }
    }

    #[must_use]
    pub fn rendered(&self) -> bool {
        self.flags.contains(PassFlags::RENDERED)
    }

    #[must_use]
    pub fn committed(&self) -> bool {
        self.flags.contains(PassFlags::COMMITTED)
    }
}

/// A selection reported by the widget.
///
/// Positions index [`ChoiceView::entries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserSelection {
    Single(usize),
    Multiple(Vec<usize>),
}

// ---------------------------------------------------------------------------
// ChoiceReconciler
// ---------------------------------------------------------------------------

/// Keeps a choice control's entries, selection and model value consistent.
#[derive(Debug, Clone)]
pub struct ChoiceReconciler {
    config: ChoiceConfig,
    options: OptionList,
    registry: OptionRegistry,
    groups: GroupTracker,
    placeholder: PlaceholderManager,
    model: ModelValue,
    selection: Selection,
}

impl ChoiceReconciler {
    /// A control with no statically declared entries.
    #[must_use]
    pub fn new(config: ChoiceConfig) -> Self {
        let registry = OptionRegistry::with_reserved(config.extra_reserved_keys.iter().cloned());
        let mut control = Self {
            config,
            options: OptionList::new(),
            registry,
            groups: GroupTracker::new(),
            placeholder: PlaceholderManager::new(None),
            model: ModelValue::Undefined,
            selection: Selection::None,
        };
        control.resolve_quietly();
        control
    }

    /// A control with statically declared entries.
    ///
    /// The first static candidate whose value is `""` becomes the empty
    /// entry; its presence is fixed for the control's lifetime. Nothing is
    /// rendered or committed.
    pub fn with_static<I>(config: ChoiceConfig, statics: I) -> Result<Self, ChoiceError>
    where
        I: IntoIterator<Item = Candidate>,
    {
        let mut registry =
            OptionRegistry::with_reserved(config.extra_reserved_keys.iter().cloned());
        let mut options = OptionList::new();
        let mut groups = GroupTracker::new();
        let mut empty = None;

        let mut pass = groups.begin_pass();
        for candidate in statics {
            if candidate.value().is_empty() && empty.is_none() {
                empty = Some(EmptyEntry::new(candidate.label()));
                options.insert(
                    Slot {
                        kind: SlotKind::Empty,
                        candidate,
                    },
                    usize::MAX,
                );
                continue;
            }
            registry.register(candidate.value())?;
            pass.on_candidate_added(candidate.value(), candidate.group());
            options.insert(
                Slot {
                    kind: SlotKind::Candidate,
                    candidate,
                },
                usize::MAX,
            );
        }
        pass.commit(options.layout());

        let mut control = Self {
            config,
            options,
            registry,
            groups,
            placeholder: PlaceholderManager::new(empty),
            model: ModelValue::Undefined,
            selection: Selection::None,
        };
        control.resolve_quietly();
        Ok(control)
    }

    /// Bind an initial model value before the first render.
    #[must_use]
    pub fn with_initial_model(mut self, model: ModelValue) -> Self {
        self.model = model;
        self.resolve_quietly();
        self
    }

    fn resolve_quietly(&mut self) {
        let resolution = self.placeholder.reconcile_after_model_change(
            &self.model,
            &self.registry,
            self.config.mode,
        );
        self.selection = resolution.selection;
    }

    // -- Inspection ---------------------------------------------------------

    #[must_use]
    pub fn config(&self) -> &ChoiceConfig {
        &self.config
    }

    #[must_use]
    pub fn mode(&self) -> SelectionMode {
        self.config.mode
    }

    /// The control's copy of the bound model value.
    #[must_use]
    pub fn model(&self) -> &ModelValue {
        &self.model
    }

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Whether a candidate keyed `key` currently exists.
    ///
    /// The empty entry counts as an option keyed `""`.
    #[must_use]
    pub fn has_option(&self, key: &str) -> bool {
        self.placeholder.has_option(&self.registry, key)
    }

    /// Group of the first occurrence of `key`; `None` for top-level or
    /// absent keys.
    #[must_use]
    pub fn group_of(&self, key: &str) -> Option<&str> {
        self.groups.group_of(key)
    }

    /// Live group names in visual order.
    #[must_use]
    pub fn groups(&self) -> &[String] {
        self.groups.groups()
    }

    #[must_use]
    pub fn unknown_entry(&self) -> Option<&UnknownEntry> {
        self.placeholder.unknown_entry()
    }

    #[must_use]
    pub fn has_empty_entry(&self) -> bool {
        self.placeholder.empty_entry().is_some()
    }

    #[must_use]
    pub fn registry(&self) -> &OptionRegistry {
        &self.registry
    }

    /// Declared entries, in visual order (no unknown entry).
    #[must_use]
    pub fn options(&self) -> &OptionList {
        &self.options
    }

    /// Current visual state.
    #[must_use]
    pub fn view(&self) -> ChoiceView {
        let mut entries = Vec::with_capacity(self.options.len() + 1);
        if let Some(unknown) = self.placeholder.unknown_entry() {
            entries.push(ViewEntry {
                kind: EntryKind::Unknown,
                value: unknown.label().to_owned(),
                label: unknown.label().to_owned(),
                group: None,
                selected: true,
            });
        }

        let selected: FxHashSet<usize> = match (&self.selection, self.config.mode) {
            (Selection::Unknown | Selection::None, _) => FxHashSet::default(),
            (_, SelectionMode::Single) => SingleBinder::to_widget(&self.model, &self.options)
                .into_iter()
                .collect(),
            (_, SelectionMode::Multiple) => MultiBinder::to_widget(&self.model, &self.options)
                .into_iter()
                .collect(),
        };

        for (index, slot) in self.options.iter().enumerate() {
            let kind = match slot.kind {
                SlotKind::Empty => EntryKind::Empty,
                SlotKind::Candidate => EntryKind::Candidate,
            };
            entries.push(ViewEntry {
                kind,
                value: slot.key().as_str().to_owned(),
                label: slot.candidate.label().to_owned(),
                group: slot.candidate.group().map(str::to_owned),
                selected: selected.contains(&index),
            });
        }

        ChoiceView {
            mode: self.config.mode,
            entries,
        }
    }

    // -- Passes -------------------------------------------------------------

    /// Render the initial state once.
    pub fn render_initial<H: ChoiceHost + ?Sized>(&mut self, host: &mut H) -> PassReport {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("choice_pass", kind = PassKind::Initial.as_str()).entered();

        host.render(&self.view());
        PassReport::new(PassKind::Initial, PassFlags::RENDERED)
    }

    /// Structural pass: apply one pass worth of instructions.
    ///
    /// Renders when the visual selection changed. Commits the (unchanged)
    /// model value when an unknown selection was replaced by a real match or
    /// a real match disappeared, so the model side can re-run its own checks.
    pub fn apply_changes<H: ChoiceHost + ?Sized>(
        &mut self,
        changes: ChangeSet,
        host: &mut H,
    ) -> Result<PassReport, ChoiceError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "choice_pass",
            kind = PassKind::Structural.as_str(),
            changes = changes.len()
        )
        .entered();

        for change in &changes {
            if let Some(candidate) = change.incoming() {
                self.registry.check_key(candidate.value())?;
            }
        }

        let mut deltas: FxHashMap<OptionKey, isize> = FxHashMap::default();
        let mut dropped: FxHashSet<OptionKey> = FxHashSet::default();
        let mut reshown = false;
        let mut pass = self.groups.begin_pass();
        for change in changes {
            match change {
                Change::Add {
                    candidate,
                    position,
                } => {
                    let key = candidate.value().clone();
                    let group = candidate.group().map(str::to_owned);
                    let at = self.options.insert(
                        Slot {
                            kind: SlotKind::Candidate,
                            candidate,
                        },
                        position,
                    );
                    *deltas.entry(key.clone()).or_insert(0) += 1;
                    reshown |= lands_on_selection(&self.selection, &self.options, &key, at);
                    pass.on_candidate_added(&key, group.as_deref());
                }
                Change::Remove { key, at } => {
                    if self.options.remove(&key, at).is_some() {
                        *deltas.entry(key.clone()).or_insert(0) -= 1;
                        pass.on_candidate_removed(&key);
                        dropped.insert(key);
                    } else {
                        #[cfg(feature = "tracing")]
                        tracing::trace!(key = key.as_str(), "remove of absent candidate ignored");
                    }
                }
                Change::Move {
                    key,
                    group,
                    position,
                    from,
                } => {
                    let target = group.clone();
                    let single = matches!(&self.selection, Selection::Candidate(k) if *k == key);
                    let was_shown = single
                        && self.options.locate(&key, from)
                            == self.options.first_candidate(key.as_str());
                    match self.options.relocate(&key, group, position, from) {
                        Some(at) => {
                            let now_shown =
                                single && self.options.first_candidate(key.as_str()) == Some(at);
                            reshown |= was_shown != now_shown;
                            pass.on_candidate_moved(&key, target.as_deref());
                        }
                        None => {
                            #[cfg(feature = "tracing")]
                            tracing::trace!(key = key.as_str(), "move of absent candidate ignored");
                        }
                    }
                }
                Change::Replace { old, candidate, at } => {
                    let key = candidate.value().clone();
                    let group = candidate.group().map(str::to_owned);
                    match self.options.replace(&old, candidate, at) {
                        Some((index, _previous)) => {
                            *deltas.entry(old.clone()).or_insert(0) -= 1;
                            *deltas.entry(key.clone()).or_insert(0) += 1;
                            pass.on_candidate_removed(&old);
                            pass.on_candidate_added(&key, group.as_deref());
                            if old != key {
                                reshown |=
                                    lands_on_selection(&self.selection, &self.options, &key, index);
                                dropped.insert(old);
                            }
                        }
                        None => {
                            #[cfg(feature = "tracing")]
                            tracing::trace!(key = old.as_str(), "replace of absent candidate ignored");
                        }
                    }
                }
            }
        }
        let group_moves = pass.commit(self.options.layout());
        for (key, delta) in &deltas {
            self.registry.apply_delta(key, *delta);
        }

        let previous = std::mem::take(&mut self.selection);
        let resolution = self.placeholder.reconcile_after_structural_change(
            &self.model,
            &self.registry,
            self.config.mode,
        );
        self.selection = resolution.selection;

        let mut flags = PassFlags::from_unknown(resolution.unknown);
        if previous != self.selection {
            flags |= PassFlags::SELECTION_CHANGED;
        }
        let lost_selected_occurrence = dropped.iter().any(|key| selects(&previous, key));
        let render = flags.visual() || lost_selected_occurrence || reshown;
        let commit = matches!(
            (&previous, &self.selection),
            (Selection::Unknown, Selection::Candidate(_))
                | (Selection::Candidate(_), Selection::Unknown)
        );
        self.emit(host, commit, render, &mut flags);

        let mut report = PassReport::new(PassKind::Structural, flags);
        report.group_moves = group_moves;
        Ok(report)
    }

    /// Model-driven pass: the bound value changed externally.
    ///
    /// Always renders exactly once, even when the selection is unchanged.
    pub fn set_model<H: ChoiceHost + ?Sized>(&mut self, value: ModelValue, host: &mut H) -> PassReport {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "choice_pass",
            kind = PassKind::Model.as_str(),
            value = %value.hash_key()
        )
        .entered();

        self.model = value;
        let mut flags = self.reresolve();
        self.emit(host, false, true, &mut flags);
        PassReport::new(PassKind::Model, flags)
    }

    /// User-driven pass: the widget reports a new visual selection.
    ///
    /// Commits exactly once. Renders only if the unknown entry disappeared as
    /// a result.
    pub fn select_by_user<H: ChoiceHost + ?Sized>(
        &mut self,
        selection: UserSelection,
        host: &mut H,
    ) -> Result<PassReport, ChoiceError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("choice_pass", kind = PassKind::User.as_str()).entered();

        let value = match (self.config.mode, selection) {
            (SelectionMode::Single, UserSelection::Single(position)) => {
                let (kind, key) = self.entry_at(position)?;
                SingleBinder::to_model(kind, &key)?
            }
            (SelectionMode::Multiple, UserSelection::Multiple(mut positions)) => {
                positions.sort_unstable();
                positions.dedup();
                let mut keys = Vec::with_capacity(positions.len());
                for position in positions {
                    let (kind, key) = self.entry_at(position)?;
                    if kind == EntryKind::Unknown {
                        return Err(ChoiceError::UnknownEntrySelected);
                    }
                    keys.push(key);
                }
                let refs: Vec<&OptionKey> = keys.iter().collect();
                ModelValue::List(MultiBinder::to_model(&self.model, &refs))
            }
            (mode, _) => return Err(ChoiceError::ModeMismatch { expected: mode }),
        };

        self.model = value;
        let mut flags = self.reresolve();
        let render = flags.contains(PassFlags::UNKNOWN_REMOVED);
        self.emit(host, true, render, &mut flags);
        Ok(PassReport::new(PassKind::User, flags))
    }

    // -- Helpers ------------------------------------------------------------

    fn reresolve(&mut self) -> PassFlags {
        let previous = std::mem::take(&mut self.selection);
        let resolution = self.placeholder.reconcile_after_model_change(
            &self.model,
            &self.registry,
            self.config.mode,
        );
        self.selection = resolution.selection;
        let mut flags = PassFlags::from_unknown(resolution.unknown);
        if previous != self.selection {
            flags |= PassFlags::SELECTION_CHANGED;
        }
        flags
    }

    fn emit<H: ChoiceHost + ?Sized>(
        &self,
        host: &mut H,
        commit: bool,
        render: bool,
        flags: &mut PassFlags,
    ) {
        if commit {
            host.commit(&self.model);
            *flags |= PassFlags::COMMITTED;
        }
        if render {
            host.render(&self.view());
            *flags |= PassFlags::RENDERED;
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(flags = ?*flags, "choice pass finished");
    }

    /// Kind and key of the rendered entry at `position`.
    fn entry_at(&self, position: usize) -> Result<(EntryKind, OptionKey), ChoiceError> {
        let offset = match self.placeholder.unknown_entry() {
            Some(unknown) if position == 0 => {
                return Ok((EntryKind::Unknown, OptionKey::new(unknown.label())));
            }
            Some(_) => 1,
            None => 0,
        };
        let slot = self
            .options
            .get(position - offset)
            .ok_or(ChoiceError::SelectionOutOfRange {
                position,
                len: self.options.len() + offset,
            })?;
        let kind = match slot.kind {
            SlotKind::Empty => EntryKind::Empty,
            SlotKind::Candidate => EntryKind::Candidate,
        };
        Ok((kind, slot.key().clone()))
    }
}

/// Whether an occurrence of `key` that just landed at `at` is shown selected
/// where `selection` showed something else before.
fn lands_on_selection(
    selection: &Selection,
    options: &OptionList,
    key: &OptionKey,
    at: usize,
) -> bool {
    match selection {
        Selection::Candidate(selected) => {
            selected == key && options.first_candidate(key.as_str()) == Some(at)
        }
        Selection::Members(members) => members.binary_search(key).is_ok(),
        Selection::None | Selection::Empty | Selection::Unknown => false,
    }
}

/// Whether `selection` shows an occurrence keyed `key`.
fn selects(selection: &Selection, key: &OptionKey) -> bool {
    match selection {
        Selection::Candidate(selected) => selected == key,
        Selection::Members(members) => members.binary_search(key).is_ok(),
        Selection::None | Selection::Empty | Selection::Unknown => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::RecordingHost;

    fn robots(names: &[&str]) -> ChangeSet {
        names
            .iter()
            .fold(ChangeSet::new(), |set, n| set.append(Candidate::labeled(*n)))
    }

    fn single() -> (ChoiceReconciler, RecordingHost) {
        (
            ChoiceReconciler::new(ChoiceConfig::single()),
            RecordingHost::default(),
        )
    }

    fn with_empty(rest: &[&str]) -> ChoiceReconciler {
        let mut statics = vec![Candidate::new("", "--select--")];
        statics.extend(rest.iter().map(|n| Candidate::labeled(*n)));
        ChoiceReconciler::with_static(ChoiceConfig::single(), statics).unwrap()
    }

    #[test]
    fn new_control_shows_unknown_for_undefined() {
        let (control, _) = single();
        let view = control.view();
        assert_eq!(view.values(), vec!["? undefined:undefined ?"]);
        assert_eq!(view.unknown_count(), 1);
        assert_eq!(control.selection(), &Selection::Unknown);
    }

    #[test]
    fn render_initial_renders_once() {
        let (mut control, mut host) = single();
        let report = control.render_initial(&mut host);
        assert_eq!(report.kind, PassKind::Initial);
        assert!(report.rendered());
        assert_eq!(host.render_count(), 1);
        assert_eq!(host.commit_count(), 0);
    }

    #[test]
    fn model_pass_renders_exactly_once() {
        let (mut control, mut host) = single();
        control.apply_changes(robots(&["c3p0", "r2d2"]), &mut host).unwrap();
        host.clear();

        control.set_model("r2d2".into(), &mut host);
        assert_eq!(host.render_count(), 1);
        control.set_model("r2d2".into(), &mut host);
        assert_eq!(host.render_count(), 2);
        assert_eq!(host.renders[0], host.renders[1]);
        assert_eq!(host.commit_count(), 0);
    }

    #[test]
    fn structural_pass_without_visual_change_is_silent() {
        let (mut control, mut host) = single();
        control.apply_changes(robots(&["c3p0"]), &mut host).unwrap();
        control.set_model("c3p0".into(), &mut host);
        host.clear();

        let report = control
            .apply_changes(ChangeSet::new().add(Candidate::labeled("wallee"), 0), &mut host)
            .unwrap();
        assert!(!report.rendered());
        assert!(!report.committed());
        assert_eq!(host.render_count(), 0);
        assert_eq!(control.view().values(), vec!["wallee", "c3p0"]);
        assert_eq!(control.view().selected_values(), vec!["c3p0"]);
    }

    #[test]
    fn losing_the_match_creates_unknown_and_commits_same_value() {
        let (mut control, mut host) = single();
        control.apply_changes(robots(&["c3p0", "r2d2"]), &mut host).unwrap();
        control.set_model("r2d2".into(), &mut host);
        host.clear();

        let report = control
            .apply_changes(ChangeSet::new().remove("r2d2"), &mut host)
            .unwrap();
        assert!(report.flags.contains(PassFlags::UNKNOWN_CREATED));
        assert!(report.rendered());
        assert!(report.committed());
        assert_eq!(host.commits, vec![ModelValue::text("r2d2")]);
        assert_eq!(control.model(), &ModelValue::text("r2d2"));
        assert!(!control.has_option("r2d2"));
        assert_eq!(
            control.view().selected_values(),
            vec!["? string:r2d2 ?"]
        );
    }

    #[test]
    fn regaining_the_match_removes_unknown() {
        let (mut control, mut host) = single();
        control.apply_changes(robots(&["c3p0"]), &mut host).unwrap();
        control.set_model("r2d2".into(), &mut host);
        host.clear();

        let report = control
            .apply_changes(ChangeSet::new().add(Candidate::labeled("r2d2"), 0), &mut host)
            .unwrap();
        assert!(report.flags.contains(PassFlags::UNKNOWN_REMOVED));
        assert_eq!(host.render_count(), 1);
        assert_eq!(host.commit_count(), 1);
        assert_eq!(control.view().values(), vec!["r2d2", "c3p0"]);
        assert_eq!(control.view().selected_values(), vec!["r2d2"]);
    }

    #[test]
    fn reserved_key_rejects_whole_pass() {
        let (mut control, mut host) = single();
        control.apply_changes(robots(&["a"]), &mut host).unwrap();
        host.clear();

        let err = control
            .apply_changes(
                ChangeSet::new()
                    .remove("a")
                    .append(Candidate::labeled("hasOwnProperty")),
                &mut host,
            )
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(control.has_option("a"));
        assert_eq!(host.render_count(), 0);
    }

    #[test]
    fn reserved_static_candidate_fails_construction() {
        let err = ChoiceReconciler::with_static(
            ChoiceConfig::single(),
            [Candidate::labeled("hasOwnProperty")],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ChoiceError::ReservedKey {
                key: "hasOwnProperty".into()
            }
        );
    }

    #[test]
    fn extra_reserved_keys_apply_to_passes() {
        let mut control = ChoiceReconciler::new(ChoiceConfig::single().reserve_key("constructor"));
        let mut host = RecordingHost::default();
        assert!(
            control
                .apply_changes(robots(&["constructor"]), &mut host)
                .is_err()
        );
        let registry = control.registry();
        assert!(registry.check_key(&OptionKey::from("constructor")).is_err());
        assert!(registry.check_key(&OptionKey::from("hasOwnProperty")).is_err());
        assert!(registry.check_key(&OptionKey::from("r2d2")).is_ok());
    }

    #[test]
    fn absent_instructions_are_ignored() {
        let (mut control, mut host) = single();
        control.apply_changes(robots(&["a"]), &mut host).unwrap();
        let report = control
            .apply_changes(
                ChangeSet::new()
                    .remove("ghost")
                    .move_to("ghost", Some("g"), 0)
                    .replace("ghost", Candidate::labeled("b")),
                &mut host,
            )
            .unwrap();
        assert!(report.flags.is_empty());
        assert_eq!(control.view().values(), vec!["? undefined:undefined ?", "a"]);
    }

    #[test]
    fn replace_rewrites_label_in_place() {
        let (mut control, mut host) = single();
        control
            .apply_changes(
                ChangeSet::new()
                    .append(Candidate::new("1", "c3p0"))
                    .append(Candidate::new("2", "r2d2")),
                &mut host,
            )
            .unwrap();
        control.set_model(ModelValue::from(1), &mut host);
        host.clear();

        control
            .apply_changes(ChangeSet::new().replace("1", Candidate::new("1", "C-3PO")), &mut host)
            .unwrap();
        let view = control.view();
        assert_eq!(view.entries[0].label, "C-3PO");
        assert!(view.entries[0].selected);
        assert!(control.has_option("1"));
    }

    #[test]
    fn replacing_selected_value_drops_match() {
        let (mut control, mut host) = single();
        control.apply_changes(robots(&["a", "b"]), &mut host).unwrap();
        control.set_model("a".into(), &mut host);
        host.clear();

        let report = control
            .apply_changes(ChangeSet::new().replace("a", Candidate::labeled("z")), &mut host)
            .unwrap();
        assert!(report.committed());
        assert!(!control.has_option("a"));
        assert!(control.has_option("z"));
        assert_eq!(control.view().values(), vec!["? string:a ?", "z", "b"]);
    }

    #[test]
    fn removing_selected_duplicate_rerenders_without_commit() {
        let (mut control, mut host) = single();
        control.apply_changes(robots(&["a", "b", "a"]), &mut host).unwrap();
        control.set_model("a".into(), &mut host);
        host.clear();

        let report = control
            .apply_changes(ChangeSet::new().remove_at("a", 0), &mut host)
            .unwrap();
        assert!(report.rendered());
        assert!(!report.committed());
        assert!(control.has_option("a"));
        assert_eq!(control.view().selected_positions(), vec![1]);
    }

    #[test]
    fn adding_duplicate_before_selected_rerenders() {
        let (mut control, mut host) = single();
        control.apply_changes(robots(&["a", "b"]), &mut host).unwrap();
        control.set_model("a".into(), &mut host);
        host.clear();

        let report = control
            .apply_changes(ChangeSet::new().add(Candidate::labeled("a"), 0), &mut host)
            .unwrap();
        assert!(report.rendered());
        assert!(!report.committed());
        assert_eq!(host.render_count(), 1);
        assert_eq!(control.view().values(), vec!["a", "a", "b"]);
        assert_eq!(control.view().selected_positions(), vec![0]);

        host.clear();
        let report = control
            .apply_changes(ChangeSet::new().append(Candidate::labeled("a")), &mut host)
            .unwrap();
        assert!(!report.rendered());
        assert_eq!(control.view().selected_positions(), vec![0]);
    }

    #[test]
    fn moving_selected_behind_duplicate_rerenders() {
        let (mut control, mut host) = single();
        control.apply_changes(robots(&["a", "b", "a"]), &mut host).unwrap();
        control.set_model("a".into(), &mut host);
        host.clear();

        let report = control
            .apply_changes(ChangeSet::new().move_to("a", None, 2), &mut host)
            .unwrap();
        assert!(report.rendered());
        assert!(!report.committed());
        assert_eq!(control.view().selected_positions(), vec![1]);
    }

    #[test]
    fn moving_sole_selected_occurrence_is_silent() {
        let (mut control, mut host) = single();
        control.apply_changes(robots(&["a", "b"]), &mut host).unwrap();
        control.set_model("a".into(), &mut host);
        host.clear();

        let report = control
            .apply_changes(ChangeSet::new().move_to("a", None, 1), &mut host)
            .unwrap();
        assert!(!report.rendered());
        assert_eq!(control.view().selected_values(), vec!["a"]);
    }

    #[test]
    fn multi_duplicate_member_rerenders() {
        let mut control = ChoiceReconciler::new(ChoiceConfig::multiple());
        let mut host = RecordingHost::default();
        control.apply_changes(robots(&["A", "B"]), &mut host).unwrap();
        control.set_model(ModelValue::list(["A"]), &mut host);
        host.clear();

        let report = control
            .apply_changes(ChangeSet::new().append(Candidate::labeled("A")), &mut host)
            .unwrap();
        assert!(report.rendered());
        assert!(!report.committed());
        assert_eq!(control.view().selected_positions(), vec![0, 2]);
    }

    #[test]
    fn unknown_entry_never_shares_a_candidate_value() {
        let (mut control, mut host) = single();
        control
            .apply_changes(
                ChangeSet::new()
                    .append(Candidate::labeled("? string:wallee ?"))
                    .append(Candidate::labeled("r2d2")),
                &mut host,
            )
            .unwrap();
        control.set_model("wallee".into(), &mut host);

        let view = control.view();
        assert_eq!(
            view.values(),
            vec!["? string:wallee ? ?", "? string:wallee ?", "r2d2"]
        );
        assert_eq!(view.selected_positions(), vec![0]);
        assert_eq!(view.unknown_count(), 1);
        assert_eq!(control.selection(), &Selection::Unknown);
    }

    #[test]
    fn list_models_with_embedded_separators_refresh_unknown() {
        let (mut control, mut host) = single();
        control.apply_changes(robots(&["a", "b"]), &mut host).unwrap();
        control.set_model(ModelValue::list(["a", "b"]), &mut host);
        let before = control.unknown_entry().unwrap().label().to_owned();

        let report = control.set_model(ModelValue::list(["a,string:b"]), &mut host);
        assert!(report.flags.contains(PassFlags::UNKNOWN_REFRESHED));
        assert_ne!(control.unknown_entry().unwrap().label(), before);
    }

    #[test]
    fn user_selects_candidate_and_commits() {
        let (mut control, mut host) = single();
        control.apply_changes(robots(&["c3p0", "r2d2"]), &mut host).unwrap();
        control.set_model("r2d2".into(), &mut host);
        host.clear();

        let report = control
            .select_by_user(UserSelection::Single(0), &mut host)
            .unwrap();
        assert!(report.committed());
        assert!(!report.rendered());
        assert_eq!(host.commits, vec![ModelValue::text("c3p0")]);
        assert_eq!(control.view().selected_values(), vec!["c3p0"]);
    }

    #[test]
    fn user_selection_clears_unknown_and_renders() {
        let (mut control, mut host) = single();
        control.apply_changes(robots(&["c3p0", "r2d2"]), &mut host).unwrap();
        host.clear();

        let report = control
            .select_by_user(UserSelection::Single(2), &mut host)
            .unwrap();
        assert!(report.flags.contains(PassFlags::UNKNOWN_REMOVED));
        assert_eq!(host.commit_count(), 1);
        assert_eq!(host.render_count(), 1);
        assert_eq!(control.model(), &ModelValue::text("r2d2"));
        assert!(control.unknown_entry().is_none());
    }

    #[test]
    fn selecting_unknown_entry_is_rejected() {
        let (mut control, mut host) = single();
        control.apply_changes(robots(&["c3p0"]), &mut host).unwrap();
        host.clear();

        let err = control
            .select_by_user(UserSelection::Single(0), &mut host)
            .unwrap_err();
        assert_eq!(err, ChoiceError::UnknownEntrySelected);
        assert_eq!(host.commit_count(), 0);
        assert!(control.model().is_undefined());
    }

    #[test]
    fn out_of_range_and_mode_mismatch_are_rejected() {
        let (mut control, mut host) = single();
        control.apply_changes(robots(&["c3p0"]), &mut host).unwrap();

        assert_eq!(
            control.select_by_user(UserSelection::Single(9), &mut host),
            Err(ChoiceError::SelectionOutOfRange { position: 9, len: 2 })
        );
        assert_eq!(
            control.select_by_user(UserSelection::Multiple(vec![1]), &mut host),
            Err(ChoiceError::ModeMismatch {
                expected: SelectionMode::Single
            })
        );
    }

    #[test]
    fn empty_entry_selected_for_undefined_and_commits_empty_text() {
        let mut control = with_empty(&["x", "y"]).with_initial_model("x".into());
        let mut host = RecordingHost::default();
        assert_eq!(control.view().selected_values(), vec!["x"]);

        control
            .select_by_user(UserSelection::Single(0), &mut host)
            .unwrap();
        assert_eq!(control.model(), &ModelValue::text(""));
        assert_eq!(control.view().selected_values(), vec![""]);
        assert_eq!(control.selection(), &Selection::Empty);
    }

    #[test]
    fn empty_entry_never_removed_by_instructions() {
        let mut control = with_empty(&["x"]);
        let mut host = RecordingHost::default();
        control
            .apply_changes(ChangeSet::new().remove(""), &mut host)
            .unwrap();
        assert!(control.has_empty_entry());
        assert!(control.has_option(""));
        assert_eq!(control.view().values(), vec!["", "x"]);
    }

    #[test]
    fn multi_user_selection_preserves_prior_order() {
        let mut control = ChoiceReconciler::new(ChoiceConfig::multiple());
        let mut host = RecordingHost::default();
        control.apply_changes(robots(&["A", "B", "C"]), &mut host).unwrap();
        control.set_model(ModelValue::list(["B", "A"]), &mut host);
        host.clear();

        let report = control
            .select_by_user(UserSelection::Multiple(vec![2, 0, 1]), &mut host)
            .unwrap();
        assert!(report.committed());
        assert!(!report.rendered());
        assert_eq!(control.model(), &ModelValue::list(["B", "A", "C"]));
        assert_eq!(control.view().selected_values(), vec!["A", "B", "C"]);
    }

    #[test]
    fn multi_structural_change_never_commits() {
        let mut control = ChoiceReconciler::new(ChoiceConfig::multiple());
        let mut host = RecordingHost::default();
        control.apply_changes(robots(&["A", "B"]), &mut host).unwrap();
        control.set_model(ModelValue::list(["A", "B"]), &mut host);
        host.clear();

        let report = control
            .apply_changes(ChangeSet::new().remove("B"), &mut host)
            .unwrap();
        assert!(report.rendered());
        assert!(!report.committed());
        assert_eq!(control.model(), &ModelValue::list(["A", "B"]));
        assert_eq!(control.view().selected_values(), vec!["A"]);
        assert!(control.unknown_entry().is_none());
    }

    #[test]
    fn multi_rejects_single_selection() {
        let mut control = ChoiceReconciler::new(ChoiceConfig::multiple());
        let mut host = RecordingHost::default();
        assert_eq!(
            control.select_by_user(UserSelection::Single(0), &mut host),
            Err(ChoiceError::ModeMismatch {
                expected: SelectionMode::Multiple
            })
        );
    }

    #[test]
    fn group_moves_are_reported() {
        let (mut control, mut host) = single();
        control
            .apply_changes(
                ChangeSet::new()
                    .append(Candidate::labeled("D").in_group("first"))
                    .append(Candidate::labeled("E").in_group("second")),
                &mut host,
            )
            .unwrap();
        let report = control
            .apply_changes(ChangeSet::new().move_to("D", Some("second"), 1), &mut host)
            .unwrap();
        assert_eq!(report.group_moves.len(), 1);
        assert_eq!(report.group_moves[0].to.as_deref(), Some("second"));
        assert_eq!(control.group_of("D"), Some("second"));
        assert_eq!(control.groups(), ["second".to_string()]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Add(u8, usize),
            Remove(u8),
            Model(Option<u8>),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0u8..5, 0usize..6).prop_map(|(v, p)| Op::Add(v, p)),
                (0u8..5).prop_map(Op::Remove),
                proptest::option::of(0u8..6).prop_map(Op::Model),
            ]
        }

        proptest! {
            /// In single mode the unknown entry exists iff the model has no
            /// matching real or empty candidate, and every pass emits at most
            /// one render and one commit.
            #[test]
            fn unknown_entry_exclusivity(ops in proptest::collection::vec(op(), 1..40), empty in any::<bool>()) {
                let statics: Vec<Candidate> = if empty {
                    vec![Candidate::new("", "--")]
                } else {
                    Vec::new()
                };
                let mut control = ChoiceReconciler::with_static(ChoiceConfig::single(), statics).unwrap();
                for op in ops {
                    let mut host = RecordingHost::default();
                    match op {
                        Op::Add(v, p) => {
                            control.apply_changes(ChangeSet::new().add(Candidate::labeled(format!("v{v}")), p), &mut host).unwrap();
                        }
                        Op::Remove(v) => {
                            control.apply_changes(ChangeSet::new().remove(format!("v{v}")), &mut host).unwrap();
                        }
                        Op::Model(v) => {
                            let value = v.map_or(ModelValue::Undefined, |v| ModelValue::text(format!("v{v}")));
                            control.set_model(value, &mut host);
                            prop_assert_eq!(host.render_count(), 1);
                        }
                    }
                    prop_assert!(host.render_count() <= 1);
                    prop_assert!(host.commit_count() <= 1);

                    let view = control.view();
                    let matched = match control.model() {
                        ModelValue::Undefined => empty,
                        other => other
                            .option_key()
                            .is_some_and(|k| control.has_option(k.as_str())),
                    };
                    prop_assert_eq!(view.unknown_count(), usize::from(!matched));
                    prop_assert_eq!(view.selected_positions().len(), 1);
                }
            }
        }
    }
}
