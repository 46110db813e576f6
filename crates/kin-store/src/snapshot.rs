use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use kin_types::{Family, Handle, Person};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Full committed state of a datastore, in a serializable form.
///
/// The backlink index is not part of a snapshot; it is derived state and is
/// rebuilt by [`InMemoryDatastore::from_snapshot`](crate::InMemoryDatastore::from_snapshot).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatastoreSnapshot {
    #[serde(default)]
    pub persons: BTreeMap<Handle, Person>,
    #[serde(default)]
    pub families: BTreeMap<Handle, Family>,
    #[serde(default)]
    pub retired: BTreeSet<Handle>,
}

impl DatastoreSnapshot {
    pub fn from_json(json: &str) -> StoreResult<Self> {
        serde_json::from_str(json).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    pub fn to_json(&self) -> StoreResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Read a snapshot from a JSON file.
    pub fn read_from(path: &Path) -> StoreResult<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Write a snapshot to a JSON file, replacing it atomically.
    pub fn write_to(&self, path: &Path) -> StoreResult<()> {
        let json = self.to_json()?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}
