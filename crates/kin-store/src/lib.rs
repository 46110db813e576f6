//! Record storage for Kinstore.
//!
//! This crate defines the [`Datastore`] boundary the merge engine talks to
//! and ships an in-memory backend. Besides primary Person and Family
//! records, every backend maintains a reverse-reference ("backlink") index:
//! for any handle, the set of records that currently hold it.
//!
//! # Transactions
//!
//! Writes go through a [`Transaction`], an overlay of staged records on top
//! of the committed state. Reads and backlink queries through the
//! transaction see its own staged writes. [`Transaction::commit`] hands the
//! accumulated [`ChangeSet`] to [`Datastore::apply`], which publishes it
//! atomically; dropping an uncommitted transaction discards it.
//!
//! # Design Rules
//!
//! 1. The backlink index is updated in the same critical section as the
//!    records it describes. It is never recomputed on demand.
//! 2. Deleted handles are retired and can never be written again.
//! 3. A change set is validated in full before any of it is applied.
//! 4. All errors are propagated, never silently ignored.

pub mod changeset;
pub mod error;
pub mod integrity;
pub mod memory;
pub mod snapshot;
pub mod traits;
pub mod transaction;

pub use changeset::ChangeSet;
pub use error::{StoreError, StoreResult};
pub use integrity::IntegrityIssue;
pub use memory::InMemoryDatastore;
pub use snapshot::DatastoreSnapshot;
pub use traits::{Backlink, Datastore};
pub use transaction::Transaction;
