use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::RwLock;

use kin_types::{EntityKind, Family, Handle, HandleRef, Person};
use tracing::debug;

use crate::changeset::ChangeSet;
use crate::error::{StoreError, StoreResult};
use crate::integrity::{self, IntegrityIssue};
use crate::snapshot::DatastoreSnapshot;
use crate::traits::{Backlink, Datastore};

/// In-memory datastore.
///
/// Intended for tests, the CLI, and embedding. Records, the retired-handle
/// set, and the backlink index live together behind one `RwLock`, so a
/// change set and its index maintenance are published in a single write
/// critical section.
pub struct InMemoryDatastore {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    persons: BTreeMap<Handle, Person>,
    families: BTreeMap<Handle, Family>,
    retired: BTreeSet<Handle>,
    backlinks: HashMap<Handle, BTreeSet<Backlink>>,
}

impl State {
    fn index(&mut self, holder: Backlink, refs: &[HandleRef]) {
        for r in refs {
            self.backlinks.entry(r.handle).or_default().insert(holder);
        }
    }

    fn unindex(&mut self, holder: Backlink, refs: &[HandleRef]) {
        for r in refs {
            if let Some(set) = self.backlinks.get_mut(&r.handle) {
                set.remove(&holder);
                if set.is_empty() {
                    self.backlinks.remove(&r.handle);
                }
            }
        }
    }

    fn validate(&self, changes: &ChangeSet) -> StoreResult<()> {
        for (handle, person) in &changes.persons {
            self.validate_one(handle, EntityKind::Person, person.is_some())?;
            if person.is_none() && !self.persons.contains_key(handle) {
                return Err(StoreError::NotFound {
                    kind: EntityKind::Person,
                    handle: *handle,
                });
            }
        }
        for (handle, family) in &changes.families {
            self.validate_one(handle, EntityKind::Family, family.is_some())?;
            if family.is_none() && !self.families.contains_key(handle) {
                return Err(StoreError::NotFound {
                    kind: EntityKind::Family,
                    handle: *handle,
                });
            }
        }
        Ok(())
    }

    fn validate_one(&self, handle: &Handle, kind: EntityKind, is_write: bool) -> StoreResult<()> {
        if handle.is_null() {
            return Err(StoreError::NullHandle);
        }
        if is_write && self.retired.contains(handle) {
            return Err(StoreError::HandleRetired(*handle));
        }
        let clash = match kind {
            EntityKind::Person => self.families.contains_key(handle).then_some(EntityKind::Family),
            EntityKind::Family => self.persons.contains_key(handle).then_some(EntityKind::Person),
        };
        match clash {
            Some(existing) => Err(StoreError::KindMismatch {
                handle: *handle,
                existing,
            }),
            None => Ok(()),
        }
    }

    fn put_person(&mut self, handle: Handle, person: Option<Person>) {
        let holder = Backlink::person(handle);
        if let Some(old) = self.persons.remove(&handle) {
            self.unindex(holder, &old.references());
        }
        match person {
            Some(p) => {
                self.index(holder, &p.references());
                self.persons.insert(handle, p);
            }
            None => {
                self.retired.insert(handle);
            }
        }
    }

    fn put_family(&mut self, handle: Handle, family: Option<Family>) {
        let holder = Backlink::family(handle);
        if let Some(old) = self.families.remove(&handle) {
            self.unindex(holder, &old.references());
        }
        match family {
            Some(f) => {
                self.index(holder, &f.references());
                self.families.insert(handle, f);
            }
            None => {
                self.retired.insert(handle);
            }
        }
    }
}

impl InMemoryDatastore {
    /// Create a new empty datastore.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
        }
    }

    /// Build a datastore from a snapshot, rebuilding the backlink index.
    pub fn from_snapshot(snapshot: DatastoreSnapshot) -> Self {
        let mut state = State {
            retired: snapshot.retired,
            ..State::default()
        };
        for (handle, person) in snapshot.persons {
            state.put_person(handle, Some(person));
        }
        for (handle, family) in snapshot.families {
            state.put_family(handle, Some(family));
        }
        Self {
            state: RwLock::new(state),
        }
    }

    /// Copy out the full committed state.
    pub fn snapshot(&self) -> StoreResult<DatastoreSnapshot> {
        let state = self.read()?;
        Ok(DatastoreSnapshot {
            persons: state.persons.clone(),
            families: state.families.clone(),
            retired: state.retired.clone(),
        })
    }

    pub fn person_count(&self) -> StoreResult<usize> {
        Ok(self.read()?.persons.len())
    }

    pub fn family_count(&self) -> StoreResult<usize> {
        Ok(self.read()?.families.len())
    }

    /// Sorted handles of all stored persons.
    pub fn person_handles(&self) -> StoreResult<Vec<Handle>> {
        Ok(self.read()?.persons.keys().copied().collect())
    }

    /// Sorted handles of all stored families.
    pub fn family_handles(&self) -> StoreResult<Vec<Handle>> {
        Ok(self.read()?.families.keys().copied().collect())
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

impl Default for InMemoryDatastore {
    fn default() -> Self {
        Self::new()
    }
}

impl Datastore for InMemoryDatastore {
    fn get_person(&self, handle: &Handle) -> StoreResult<Option<Person>> {
        Ok(self.read()?.persons.get(handle).cloned())
    }

    fn get_family(&self, handle: &Handle) -> StoreResult<Option<Family>> {
        Ok(self.read()?.families.get(handle).cloned())
    }

    fn find_backlink_handles(&self, handle: &Handle) -> StoreResult<Vec<Backlink>> {
        Ok(self
            .read()?
            .backlinks
            .get(handle)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }

    fn is_retired(&self, handle: &Handle) -> StoreResult<bool> {
        Ok(self.read()?.retired.contains(handle))
    }

    fn apply(&self, changes: ChangeSet) -> StoreResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;

        // Nothing is touched until the whole set has been checked.
        state.validate(&changes)?;

        let label = changes.label().to_string();
        let count = changes.len();
        for (handle, person) in changes.persons {
            state.put_person(handle, person);
        }
        for (handle, family) in changes.families {
            state.put_family(handle, family);
        }
        debug!(label = %label, records = count, "change set applied");
        Ok(())
    }

    /// Includes a comparison of the backlink index against a full rebuild.
    fn check_integrity(&self) -> StoreResult<Vec<IntegrityIssue>> {
        let state = self.read()?;
        let mut issues = integrity::check_records(&state.persons, &state.families);

        let mut rebuilt: HashMap<Handle, BTreeSet<Backlink>> = HashMap::new();
        for p in state.persons.values() {
            for r in p.references() {
                rebuilt.entry(r.handle).or_default().insert(Backlink::person(p.handle));
            }
        }
        for f in state.families.values() {
            for r in f.references() {
                rebuilt.entry(r.handle).or_default().insert(Backlink::family(f.handle));
            }
        }
        if rebuilt != state.backlinks {
            let mut targets: BTreeSet<Handle> = rebuilt.keys().copied().collect();
            targets.extend(state.backlinks.keys().copied());
            for target in targets {
                if rebuilt.get(&target) != state.backlinks.get(&target) {
                    issues.push(IntegrityIssue::StaleBacklinkIndex { target });
                }
            }
        }
        Ok(issues)
    }
}

impl std::fmt::Debug for InMemoryDatastore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (persons, families) = match self.state.read() {
            Ok(s) => (s.persons.len(), s.families.len()),
            Err(_) => (0, 0),
        };
        f.debug_struct("InMemoryDatastore")
            .field("person_count", &persons)
            .field("family_count", &families)
            .finish()
    }
}
