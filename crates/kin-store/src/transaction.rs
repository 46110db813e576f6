//! Overlay transactions over a [`Datastore`].

use std::collections::BTreeSet;

use kin_types::{EntityKind, Family, Handle, Person};
use tracing::{debug, warn};

use crate::changeset::ChangeSet;
use crate::error::{StoreError, StoreResult};
use crate::traits::{Backlink, Datastore};

/// A unit of work against a datastore.
///
/// Writes are staged locally and become visible to other readers only when
/// [`commit`](Self::commit) succeeds. Reads through the transaction see the
/// committed state with the staged writes layered on top, and
/// [`find_backlink_handles`](Self::find_backlink_handles) accounts for them
/// as well. Dropping an uncommitted transaction rolls it back.
pub struct Transaction<'a> {
    store: &'a dyn Datastore,
    changes: ChangeSet,
    finished: bool,
}

impl<'a> Transaction<'a> {
    /// Open a transaction on `store`.
    pub fn begin(store: &'a dyn Datastore, label: impl Into<String>) -> Self {
        let changes = ChangeSet::new(label);
        debug!(label = changes.label(), "transaction opened");
        Self {
            store,
            changes,
            finished: false,
        }
    }

    pub fn label(&self) -> &str {
        self.changes.label()
    }

    /// The writes staged so far.
    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    pub fn get_person(&self, handle: &Handle) -> StoreResult<Option<Person>> {
        match self.changes.staged_person(handle) {
            Some(staged) => Ok(staged.cloned()),
            None => self.store.get_person(handle),
        }
    }

    pub fn get_family(&self, handle: &Handle) -> StoreResult<Option<Family>> {
        match self.changes.staged_family(handle) {
            Some(staged) => Ok(staged.cloned()),
            None => self.store.get_family(handle),
        }
    }

    /// Stage an insert or update of a person.
    pub fn commit_person(&mut self, person: Person) -> StoreResult<()> {
        self.check_writable(&person.handle)?;
        debug!(person = %person.handle.short_id(), "staged person");
        self.changes.put_person(person);
        Ok(())
    }

    /// Stage an insert or update of a family.
    pub fn commit_family(&mut self, family: Family) -> StoreResult<()> {
        self.check_writable(&family.handle)?;
        debug!(family = %family.handle.short_id(), "staged family");
        self.changes.put_family(family);
        Ok(())
    }

    /// Stage the removal of a person that exists in this transaction's view.
    pub fn remove_person(&mut self, handle: &Handle) -> StoreResult<()> {
        if self.get_person(handle)?.is_none() {
            return Err(StoreError::NotFound {
                kind: EntityKind::Person,
                handle: *handle,
            });
        }
        debug!(person = %handle.short_id(), "staged person removal");
        self.changes.delete_person(*handle);
        Ok(())
    }

    /// Stage the removal of a family that exists in this transaction's view.
    pub fn remove_family(&mut self, handle: &Handle) -> StoreResult<()> {
        if self.get_family(handle)?.is_none() {
            return Err(StoreError::NotFound {
                kind: EntityKind::Family,
                handle: *handle,
            });
        }
        debug!(family = %handle.short_id(), "staged family removal");
        self.changes.delete_family(*handle);
        Ok(())
    }

    /// Every record that references `handle` in this transaction's view.
    ///
    /// Committed holders that were restaged are re-examined against their
    /// staged state; staged records that newly reference `handle` are added.
    pub fn find_backlink_handles(&self, handle: &Handle) -> StoreResult<Vec<Backlink>> {
        let mut links: BTreeSet<Backlink> = self
            .store
            .find_backlink_handles(handle)?
            .into_iter()
            .filter(|b| !self.is_staged(b))
            .collect();

        for person in self.changes.written_persons() {
            if person.references().iter().any(|r| &r.handle == handle) {
                links.insert(Backlink::person(person.handle));
            }
        }
        for family in self.changes.written_families() {
            if family.references().iter().any(|r| &r.handle == handle) {
                links.insert(Backlink::family(family.handle));
            }
        }
        Ok(links.into_iter().collect())
    }

    pub fn find_backlinks_of_kind(
        &self,
        handle: &Handle,
        kind: EntityKind,
    ) -> StoreResult<Vec<Backlink>> {
        Ok(self
            .find_backlink_handles(handle)?
            .into_iter()
            .filter(|b| b.kind == kind)
            .collect())
    }

    /// Publish every staged write atomically.
    pub fn commit(mut self) -> StoreResult<()> {
        self.finished = true;
        let changes = std::mem::take(&mut self.changes);
        let label = changes.label().to_string();
        let count = changes.len();
        let removed = changes.removed_persons().count() + changes.removed_families().count();
        self.store.apply(changes)?;
        debug!(label = %label, records = count, removed, "transaction committed");
        Ok(())
    }

    /// Discard every staged write.
    pub fn rollback(mut self) {
        self.finished = true;
        debug!(
            label = self.changes.label(),
            records = self.changes.len(),
            "transaction rolled back"
        );
    }

    fn is_staged(&self, link: &Backlink) -> bool {
        match link.kind {
            EntityKind::Person => self.changes.staged_person(&link.holder).is_some(),
            EntityKind::Family => self.changes.staged_family(&link.holder).is_some(),
        }
    }

    fn check_writable(&self, handle: &Handle) -> StoreResult<()> {
        if handle.is_null() {
            return Err(StoreError::NullHandle);
        }
        if self.changes.is_removed(handle) || self.store.is_retired(handle)? {
            return Err(StoreError::HandleRetired(*handle));
        }
        Ok(())
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.finished && !self.changes.is_empty() {
            warn!(
                label = self.changes.label(),
                records = self.changes.len(),
                "uncommitted transaction dropped; changes discarded"
            );
        }
    }
}
