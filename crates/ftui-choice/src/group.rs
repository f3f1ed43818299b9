#![forbid(unsafe_code)]

//! Group membership tracking.
//!
//! Candidates may live under a named group (rendered as a heading block) or
//! at the top level. The tracker remembers, for every live key, the group of
//! each of its occurrences in visual order.
//!
//! Membership changes are staged in a [`GroupPass`] and applied in one step by
//! [`GroupPass::commit`]. Until then the tracker keeps answering from the
//! previous pass, so a candidate moving between groups is never observed as
//! missing and its reported group flips atomically.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::key::OptionKey;

type Placements = SmallVec<[Option<String>; 1]>;

/// A membership event recorded during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupEvent {
    Added {
        key: OptionKey,
        group: Option<String>,
    },
    Removed {
        key: OptionKey,
    },
    Moved {
        key: OptionKey,
        group: Option<String>,
    },
}

impl GroupEvent {
    #[must_use]
    pub fn key(&self) -> &OptionKey {
        match self {
            Self::Added { key, .. } | Self::Removed { key } | Self::Moved { key, .. } => key,
        }
    }
}

/// A key whose reported group changed during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMove {
    pub key: OptionKey,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Group membership for every live key.
#[derive(Debug, Clone, Default)]
pub struct GroupTracker {
    placements: FxHashMap<OptionKey, Placements>,
    order: Vec<String>,
}

impl GroupTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start staging membership changes for one pass.
    pub fn begin_pass(&mut self) -> GroupPass<'_> {
        GroupPass {
            tracker: self,
            events: Vec::new(),
        }
    }

    /// Whether any occurrence of `key` is tracked.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.placements.contains_key(key)
    }

    /// Group of the first occurrence of `key`.
    ///
    /// `None` when the key is untracked or lives at the top level; use
    /// [`contains`](Self::contains) to tell the two apart.
    #[must_use]
    pub fn group_of(&self, key: &str) -> Option<&str> {
        self.placements
            .get(key)
            .and_then(|groups| groups.first())
            .and_then(|group| group.as_deref())
    }

    /// Number of tracked occurrences of `key`.
    #[must_use]
    pub fn occurrences(&self, key: &str) -> usize {
        self.placements.get(key).map_or(0, SmallVec::len)
    }

    /// Live group names in first-seen visual order.
    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.order
    }
}

/// Staged membership changes for one pass.
#[derive(Debug)]
pub struct GroupPass<'a> {
    tracker: &'a mut GroupTracker,
    events: Vec<GroupEvent>,
}

impl GroupPass<'_> {
    pub fn on_candidate_added(&mut self, key: &OptionKey, group: Option<&str>) {
        self.events.push(GroupEvent::Added {
            key: key.clone(),
            group: group.map(str::to_owned),
        });
    }

    pub fn on_candidate_removed(&mut self, key: &OptionKey) {
        self.events.push(GroupEvent::Removed { key: key.clone() });
    }

    pub fn on_candidate_moved(&mut self, key: &OptionKey, group: Option<&str>) {
        self.events.push(GroupEvent::Moved {
            key: key.clone(),
            group: group.map(str::to_owned),
        });
    }

    /// Events staged so far, in arrival order.
    #[must_use]
    pub fn events(&self) -> &[GroupEvent] {
        &self.events
    }

    /// Apply the staged changes against the final layout of the pass.
    ///
    /// `layout` yields every candidate occurrence in visual order as
    /// `(key, group)`. Only keys touched by an event are re-read from it.
    /// Returns the keys whose reported group changed.
    pub fn commit<'k, I>(self, layout: I) -> Vec<GroupMove>
    where
        I: IntoIterator<Item = (&'k OptionKey, Option<&'k str>)>,
    {
        let Self { tracker, events } = self;
        let touched: FxHashSet<&OptionKey> = events.iter().map(GroupEvent::key).collect();

        let mut fresh: FxHashMap<OptionKey, Placements> = FxHashMap::default();
        let mut order: Vec<String> = Vec::new();
        for (key, group) in layout {
            if let Some(name) = group
                && !order.iter().any(|g| g == name)
            {
                order.push(name.to_owned());
            }
            if touched.contains(key) {
                fresh
                    .entry(key.clone())
                    .or_default()
                    .push(group.map(str::to_owned));
            }
        }

        let mut moves = Vec::new();
        for key in touched {
            let before = tracker
                .placements
                .get(key)
                .and_then(|groups| groups.first().cloned());
            match fresh.remove(key) {
                Some(groups) => {
                    let after = groups.first().cloned();
                    if let (Some(from), Some(to)) = (before, after)
                        && from != to
                    {
                        moves.push(GroupMove {
                            key: key.clone(),
                            from,
                            to,
                        });
                    }
                    tracker.placements.insert(key.clone(), groups);
                }
                None => {
                    tracker.placements.remove(key);
                }
            }
        }
        moves.sort_by(|a, b| a.key.cmp(&b.key));
        tracker.order = order;

        #[cfg(feature = "tracing")]
        tracing::trace!(events = events.len(), moves = moves.len(), "group pass committed");

        moves
    }
}
