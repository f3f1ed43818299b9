#![forbid(unsafe_code)]

//! Option-set reconciliation for choice controls.
//!
//! A choice control is a single or multi select list whose candidates come
//! from an externally owned, mutating collection and whose selection is bound
//! to a model value. This crate keeps the two consistent:
//!
//! - [`registry`] tracks which candidate identities currently exist.
//! - [`group`] tracks which named group each identity lives in.
//! - [`placeholder`] decides when a synthetic unknown entry is needed and
//!   recognizes the statically declared empty entry.
//! - [`binder`] translates between visual selection and model values.
//! - [`reconciler`] runs structural, model-driven and user-driven passes and
//!   emits at most one render and one commit per pass.
//!
//! # Example
//!
//! ```
//! use ftui_choice::{Candidate, ChangeSet, ChoiceConfig, ChoiceReconciler, ModelValue};
//! use ftui_choice::host::RecordingHost;
//!
//! let mut control = ChoiceReconciler::new(ChoiceConfig::single());
//! let mut host = RecordingHost::default();
//!
//! control
//!     .apply_changes(
//!         ChangeSet::new()
//!             .append(Candidate::labeled("c3p0"))
//!             .append(Candidate::labeled("r2d2")),
//!         &mut host,
//!     )
//!     .unwrap();
//!
//! control.set_model(ModelValue::text("wallee"), &mut host);
//! assert_eq!(control.view().selected_values(), vec!["? string:wallee ?"]);
//!
//! control.set_model(ModelValue::text("r2d2"), &mut host);
//! assert!(control.unknown_entry().is_none());
//! assert_eq!(control.view().selected_values(), vec!["r2d2"]);
//! ```

pub mod binder;
pub mod change;
pub mod config;
pub mod error;
pub mod group;
pub mod host;
pub mod key;
pub mod options;
pub mod placeholder;
pub mod reconciler;
pub mod registry;
pub mod view;

pub use change::{Candidate, Change, ChangeSet};
pub use config::{ChoiceConfig, SelectionMode};
pub use error::ChoiceError;
pub use group::{GroupMove, GroupTracker};
pub use host::ChoiceHost;
pub use key::{ModelValue, OptionKey};
pub use placeholder::{EmptyEntry, PlaceholderManager, Selection, UnknownEntry};
pub use reconciler::{ChoiceReconciler, PassFlags, PassKind, PassReport, UserSelection};
pub use registry::OptionRegistry;
pub use view::{ChoiceView, EntryKind, ViewEntry};
