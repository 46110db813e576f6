use std::collections::BTreeMap;

use kin_types::{Family, Handle, Person};

/// The staged writes of one transaction.
///
/// Each handle maps to its final state: `Some(record)` for an insert or
/// update, `None` for a removal. Staging a handle twice keeps only the last
/// state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    label: String,
    pub(crate) persons: BTreeMap<Handle, Option<Person>>,
    pub(crate) families: BTreeMap<Handle, Option<Family>>,
}

impl ChangeSet {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            persons: BTreeMap::new(),
            families: BTreeMap::new(),
        }
    }

    /// The human-readable label ("Merge Person", ...).
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn put_person(&mut self, person: Person) {
        self.persons.insert(person.handle, Some(person));
    }

    pub fn put_family(&mut self, family: Family) {
        self.families.insert(family.handle, Some(family));
    }

    pub fn delete_person(&mut self, handle: Handle) {
        self.persons.insert(handle, None);
    }

    pub fn delete_family(&mut self, handle: Handle) {
        self.families.insert(handle, None);
    }

    /// Staged state of a person: `None` if untouched, `Some(None)` if
    /// removed.
    pub fn staged_person(&self, handle: &Handle) -> Option<Option<&Person>> {
        self.persons.get(handle).map(Option::as_ref)
    }

    pub fn staged_family(&self, handle: &Handle) -> Option<Option<&Family>> {
        self.families.get(handle).map(Option::as_ref)
    }

    /// Staged persons that still exist after the change set.
    pub fn written_persons(&self) -> impl Iterator<Item = &Person> {
        self.persons.values().flatten()
    }

    pub fn written_families(&self) -> impl Iterator<Item = &Family> {
        self.families.values().flatten()
    }

    pub fn removed_persons(&self) -> impl Iterator<Item = &Handle> {
        self.persons
            .iter()
            .filter(|(_, p)| p.is_none())
            .map(|(h, _)| h)
    }

    pub fn removed_families(&self) -> impl Iterator<Item = &Handle> {
        self.families
            .iter()
            .filter(|(_, f)| f.is_none())
            .map(|(h, _)| h)
    }

    /// Returns `true` if `handle` is staged for removal in either table.
    pub fn is_removed(&self, handle: &Handle) -> bool {
        matches!(self.persons.get(handle), Some(None))
            || matches!(self.families.get(handle), Some(None))
    }

    /// Number of staged records (writes and removals).
    pub fn len(&self) -> usize {
        self.persons.len() + self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty() && self.families.is_empty()
    }
}
