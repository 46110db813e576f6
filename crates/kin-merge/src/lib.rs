//! Merge engine for Kinstore.
//!
//! Combines two duplicate Person records, or two duplicate Family records,
//! into one surviving record. Every record that referenced the eliminated
//! record is rewritten to reference the survivor, illegal pairings (spouses,
//! parent and child) are refused before anything is written, and the whole
//! operation runs inside one datastore transaction.
//!
//! # Components
//!
//! - [`validator`]: Pure relationship checks run before any mutation
//! - [`content`]: Union/OR/prefer-survivor policy for record content
//! - [`person`]: Person merge: fold, rewrite backlinks, collapse families
//! - [`family`]: Family merge: reconcile parents, move children, rewrite
//! - `collapse`: Duplicate-couple scan shared by both merges
//! - [`MergeEngine`]: Public entry point owning the datastore handle
//!
//! # Cascades
//!
//! Merging two people can leave two families with the same couple; exactly
//! one such pair is collapsed automatically. Merging two families merges
//! their differing parents, which recurses into the person merge. All of it
//! shares one transaction, bounded by [`MergeConfig::max_cascade_depth`].

pub mod alignment;
pub mod config;
pub mod content;
pub mod engine;
pub mod error;
pub mod family;
pub mod person;
pub mod summary;
pub mod validator;

mod collapse;
mod session;

#[cfg(test)]
mod fixtures;

pub use alignment::{ParentSlot, SlotAlignment};
pub use config::MergeConfig;
pub use content::{Equivalence, Mergeable};
pub use engine::MergeEngine;
pub use error::{ConfigError, ConflictKind, MergeError, MergeResult};
pub use summary::MergeSummary;
