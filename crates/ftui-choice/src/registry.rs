#![forbid(unsafe_code)]

//! Existence tracking for candidate identities.
//!
//! The registry answers one question: does a candidate with key `K` currently
//! exist? It counts occurrences so that duplicate candidates (equal values,
//! possibly different labels) can come and go independently. It carries no
//! ordering and no policy.
//!
//! # Invariants
//!
//! 1. `exists(k)` is true iff `count(k) > 0`.
//! 2. A key whose count reaches zero is dropped from the map.
//! 3. Reserved keys are never stored.

use rustc_hash::FxHashMap;

use crate::error::ChoiceError;
use crate::key::{self, OptionKey};

/// Occurrence counts per candidate key.
#[derive(Debug, Clone, Default)]
pub struct OptionRegistry {
    counts: FxHashMap<OptionKey, usize>,
    extra_reserved: Vec<String>,
}

impl OptionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry rejecting `extra` keys on top of [`key::RESERVED_KEYS`].
    #[must_use]
    pub fn with_reserved(extra: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            counts: FxHashMap::default(),
            extra_reserved: extra.into_iter().map(Into::into).collect(),
        }
    }

    /// Fail with [`ChoiceError::ReservedKey`] if `key` may not be registered.
    pub fn check_key(&self, key: &OptionKey) -> Result<(), ChoiceError> {
        let raw = key.as_str();
        if key::is_reserved(raw) || self.extra_reserved.iter().any(|k| k == raw) {
            return Err(ChoiceError::ReservedKey {
                key: raw.to_owned(),
            });
        }
        Ok(())
    }

    /// Add one occurrence of `key`, returning the new count.
    pub fn register(&mut self, key: &OptionKey) -> Result<usize, ChoiceError> {
        self.check_key(key)?;
        let count = self.counts.entry(key.clone()).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    /// Remove one occurrence of `key`, returning the remaining count.
    ///
    /// Unregistering an untracked key is a no-op.
    pub fn unregister(&mut self, key: &OptionKey) -> usize {
        let Some(count) = self.counts.get_mut(key.as_str()) else {
            #[cfg(feature = "tracing")]
            tracing::trace!(key = key.as_str(), "unregister of untracked key ignored");
            return 0;
        };
        *count -= 1;
        let remaining = *count;
        if remaining == 0 {
            self.counts.remove(key.as_str());
        }
        remaining
    }

    /// Apply a net occurrence delta accumulated over a pass.
    ///
    /// Callers validate keys before the pass mutates anything, so positive
    /// deltas are not re-checked here. Negative deltas saturate at zero.
    pub(crate) fn apply_delta(&mut self, key: &OptionKey, delta: isize) {
        if delta == 0 {
            return;
        }
        let current = self.count(key.as_str());
        let next = current.saturating_add_signed(delta);
        #[cfg(feature = "tracing")]
        if delta < 0 && delta.unsigned_abs() > current {
            tracing::trace!(
                key = key.as_str(),
                current,
                delta,
                "negative delta exceeds tracked count"
            );
        }
        if next == 0 {
            self.counts.remove(key.as_str());
        } else {
            self.counts.insert(key.clone(), next);
        }
    }

    #[must_use]
    pub fn exists(&self, key: &str) -> bool {
        self.counts.contains_key(key)
    }

    #[must_use]
    pub fn count(&self, key: &str) -> usize {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Number of distinct live keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Live keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &OptionKey> {
        self.counts.keys()
    }
}
