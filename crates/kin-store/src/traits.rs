use std::fmt;

use kin_types::{EntityKind, Family, Handle, Person};
use serde::{Deserialize, Serialize};

use crate::changeset::ChangeSet;
use crate::error::StoreResult;
use crate::integrity::IntegrityIssue;

/// One record that holds a reference to some handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Backlink {
    /// The kind of the holding record.
    pub kind: EntityKind,
    /// The holding record's handle.
    pub holder: Handle,
}

impl Backlink {
    pub fn person(holder: Handle) -> Self {
        Self {
            kind: EntityKind::Person,
            holder,
        }
    }

    pub fn family(holder: Handle) -> Self {
        Self {
            kind: EntityKind::Family,
            holder,
        }
    }
}

impl fmt::Display for Backlink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.holder)
    }
}

/// Handle-indexed storage of Person and Family records.
///
/// All implementations must satisfy these invariants:
/// - `find_backlink_handles(h)` is exact: it lists every record holding `h`
///   at the moment of the call, each holder once, in a stable order.
/// - `apply` is atomic: either every change in the set becomes visible
///   together with the matching backlink index update, or none does.
/// - Removed handles are retired; `apply` rejects any later write to them.
/// - Records are returned by value; callers mutate copies and write them
///   back through a [`Transaction`](crate::Transaction).
pub trait Datastore: Send + Sync {
    /// Read a person by handle. Returns `Ok(None)` if it does not exist.
    fn get_person(&self, handle: &Handle) -> StoreResult<Option<Person>>;

    /// Read a family by handle. Returns `Ok(None)` if it does not exist.
    fn get_family(&self, handle: &Handle) -> StoreResult<Option<Family>>;

    /// Every record that currently references `handle`.
    fn find_backlink_handles(&self, handle: &Handle) -> StoreResult<Vec<Backlink>>;

    /// Returns `true` if `handle` belonged to a record that was removed.
    fn is_retired(&self, handle: &Handle) -> StoreResult<bool>;

    /// Atomically publish a change set.
    fn apply(&self, changes: ChangeSet) -> StoreResult<()>;

    /// Run every referential-integrity check over the committed state.
    fn check_integrity(&self) -> StoreResult<Vec<IntegrityIssue>>;

    /// Backlinks restricted to holders of one kind.
    fn find_backlinks_of_kind(
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
}
