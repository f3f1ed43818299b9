#![forbid(unsafe_code)]

//! Candidates and per-pass structural change sets.
//!
//! The collaborator that expands repeated candidates hands the reconciler one
//! [`ChangeSet`] per pass: an ordered list of add/remove/move/replace
//! instructions. [`ChangeSet::diff`] derives such a list from the before and
//! after states of a repeated block.

use rustc_hash::FxHashMap;

use crate::key::OptionKey;

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// One selectable entry bound to an underlying value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    value: OptionKey,
    label: String,
    group: Option<String>,
}

impl Candidate {
    /// A candidate with an explicit value and display label.
    #[must_use]
    pub fn new(value: impl Into<OptionKey>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            group: None,
        }
    }

    /// A candidate whose value is its label.
    #[must_use]
    pub fn labeled(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            value: OptionKey::new(label.as_str()),
            label,
            group: None,
        }
    }

    /// Override the value; an explicit value always wins over the label.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<OptionKey>) -> Self {
        self.value = value.into();
        self
    }

    /// Place the candidate under a named group.
    #[must_use]
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    #[must_use]
    pub fn value(&self) -> &OptionKey {
        &self.value
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub(crate) fn set_group(&mut self, group: Option<String>) {
        self.group = group;
    }
}

// ---------------------------------------------------------------------------
// Change
// ---------------------------------------------------------------------------

/// A single structural instruction.
///
/// Positions index the control's declared entries (static entries, the empty
/// entry and repeated candidates; never the synthetic unknown entry). Out of
/// range positions clamp to the end. `at`/`from` hints pick a specific
/// occurrence of a duplicated key; without a hint, or when the hinted slot
/// holds another key, the first occurrence in visual order is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Add {
        candidate: Candidate,
        position: usize,
    },
    Remove {
        key: OptionKey,
        at: Option<usize>,
    },
    /// Relocate an occurrence, possibly into another group. `position` is
    /// interpreted after the occurrence has been taken out.
    Move {
        key: OptionKey,
        group: Option<String>,
        position: usize,
        from: Option<usize>,
    },
    /// Rewrite an occurrence in place (value, label and group).
    Replace {
        old: OptionKey,
        candidate: Candidate,
        at: Option<usize>,
    },
}

impl Change {
    /// Candidate introduced by this change, if any.
    #[must_use]
    pub fn incoming(&self) -> Option<&Candidate> {
        match self {
            Self::Add { candidate, .. } | Self::Replace { candidate, .. } => Some(candidate),
            Self::Remove { .. } | Self::Move { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ChangeSet
// ---------------------------------------------------------------------------

/// Ordered structural instructions for one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn add(mut self, candidate: Candidate, position: usize) -> Self {
        self.changes.push(Change::Add {
            candidate,
            position,
        });
        self
    }

    /// Add a candidate after every existing entry.
    #[must_use]
    pub fn append(self, candidate: Candidate) -> Self {
        self.add(candidate, usize::MAX)
    }

    #[must_use]
    pub fn remove(mut self, key: impl Into<OptionKey>) -> Self {
        self.changes.push(Change::Remove {
            key: key.into(),
            at: None,
        });
        self
    }

    #[must_use]
    pub fn remove_at(mut self, key: impl Into<OptionKey>, at: usize) -> Self {
        self.changes.push(Change::Remove {
            key: key.into(),
            at: Some(at),
        });
        self
    }

    #[must_use]
    pub fn move_to(
        mut self,
        key: impl Into<OptionKey>,
        group: Option<&str>,
        position: usize,
    ) -> Self {
        self.changes.push(Change::Move {
            key: key.into(),
            group: group.map(str::to_owned),
            position,
            from: None,
        });
        self
    }

    #[must_use]
    pub fn replace(mut self, old: impl Into<OptionKey>, candidate: Candidate) -> Self {
        self.changes.push(Change::Replace {
            old: old.into(),
            candidate,
            at: None,
        });
        self
    }

    pub fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.changes.iter()
    }

    /// Instructions turning `previous` into `next`.
    ///
    /// Both slices describe one contiguous block of candidates starting at
    /// entry position `base`. Identity is the candidate value: surplus
    /// occurrences are removed from the back first, then a forward walk moves
    /// later occurrences up, inserts missing ones and rewrites label or group
    /// changes in place.
    #[must_use]
    pub fn diff(base: usize, previous: &[Candidate], next: &[Candidate]) -> Self {
        let mut set = Self::new();
        let mut work: Vec<Candidate> = previous.to_vec();

        let mut wanted: FxHashMap<&OptionKey, usize> = FxHashMap::default();
        for candidate in next {
            *wanted.entry(candidate.value()).or_insert(0) += 1;
        }
        let mut kept: FxHashMap<OptionKey, usize> = FxHashMap::default();
        let mut surplus = Vec::new();
        for (index, candidate) in work.iter().enumerate() {
            let seen = kept.entry(candidate.value().clone()).or_insert(0);
            *seen += 1;
            if *seen > wanted.get(candidate.value()).copied().unwrap_or(0) {
                surplus.push(index);
            }
        }
        for index in surplus.into_iter().rev() {
            let removed = work.remove(index);
            set.push(Change::Remove {
                key: removed.value,
                at: Some(base + index),
            });
        }

        for (index, target) in next.iter().enumerate() {
            let in_place = work
                .get(index)
                .is_some_and(|current| current.value() == target.value());
            if !in_place {
                let later = (index + 1..work.len()).find(|&j| work[j].value() == target.value());
                match later {
                    Some(from) => {
                        let mut moved = work.remove(from);
                        moved.set_group(target.group.clone());
                        work.insert(index, moved);
                        set.push(Change::Move {
                            key: target.value.clone(),
                            group: target.group.clone(),
                            position: base + index,
                            from: Some(base + from),
                        });
                    }
                    None => {
                        work.insert(index, target.clone());
                        set.push(Change::Add {
                            candidate: target.clone(),
                            position: base + index,
                        });
                        continue;
                    }
                }
            }

            let current = &mut work[index];
            if current.label != target.label {
                *current = target.clone();
                set.push(Change::Replace {
                    old: target.value.clone(),
                    candidate: target.clone(),
                    at: Some(base + index),
                });
            } else if current.group != target.group {
                current.set_group(target.group.clone());
                set.push(Change::Move {
                    key: target.value.clone(),
                    group: target.group.clone(),
                    position: base + index,
                    from: Some(base + index),
                });
            }
        }

        set
    }
}

impl IntoIterator for ChangeSet {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a Change;
    type IntoIter = std::slice::Iter<'a, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

impl FromIterator<Change> for ChangeSet {
    fn from_iter<T: IntoIterator<Item = Change>>(iter: T) -> Self {
        Self {
            changes: iter.into_iter().collect(),
        }
    }
}
