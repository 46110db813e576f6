//! Foundation types for Kinstore.
//!
//! This crate provides the record types stored in a genealogical datastore
//! and the reference plumbing every other Kinstore crate relies on. Records
//! point at each other exclusively through [`Handle`]s; each record type can
//! enumerate the handles it holds and rewrite one handle to another.
//!
//! # Key Types
//!
//! - [`Handle`]: Opaque, never-reused identifier (UUID v7)
//! - [`Person`]: An individual with spouse and child family memberships
//! - [`Family`]: A father/mother pair with an ordered child list
//! - [`ChildRef`]: A child link carrying per-parent relation tags
//! - [`RecordContent`]: Notes, attributes, media, events, privacy flag
//! - [`EntityKind`]: Which table a handle lives in

pub mod content;
pub mod error;
pub mod family;
pub mod handle;
pub mod person;
pub mod reference;

pub use content::{Attribute, Event, MediaRef, Name, Note, RecordContent};
pub use error::TypeError;
pub use family::{ChildRef, ChildRelation, Couple, Family, FamilyRelType};
pub use handle::Handle;
pub use person::{Gender, Ordinance, OrdinanceKind, Person, PersonRef};
pub use reference::{replace_in_list, EntityKind, HandleRef};
