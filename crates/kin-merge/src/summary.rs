use kin_types::{EntityKind, Handle};
use serde::{Deserialize, Serialize};

/// What a committed merge did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSummary {
    /// Kind of the top-level records merged.
    pub kind: EntityKind,
    /// The record that remains.
    pub survivor: Handle,
    /// Surviving families whose references were rewritten.
    pub families_touched: Vec<Handle>,
    /// Families removed, in the order they were collapsed. For a family
    /// merge this includes the top-level casualty.
    pub families_collapsed: Vec<Handle>,
    /// Persons removed, in the order they were merged away. For a person
    /// merge this includes the top-level casualty.
    pub persons_merged: Vec<Handle>,
}

impl MergeSummary {
    /// Returns `true` if the merge cascaded beyond the requested pair.
    pub fn cascaded(&self) -> bool {
        match self.kind {
            EntityKind::Person => !self.families_collapsed.is_empty() || self.persons_merged.len() > 1,
            EntityKind::Family => !self.persons_merged.is_empty() || self.families_collapsed.len() > 1,
        }
    }
}
