use std::fmt;

use kin_store::StoreError;
use kin_types::{EntityKind, Handle};
use serde::{Deserialize, Serialize};

/// Which relationship blocked a person merge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictKind {
    /// The two people are spouses in a shared family.
    Spousal,
    /// One person is a parent of the other through some family.
    ParentChild,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictKind::Spousal => write!(
                f,
                "these two people are spouses; break that relationship before merging"
            ),
            ConflictKind::ParentChild => write!(
                f,
                "one of these people is a parent of the other; break that relationship before merging"
            ),
        }
    }
}

/// Errors from merge operations.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// An illegal relationship between the records to merge.
    #[error("cannot merge {first} and {second}: {kind}")]
    Conflict {
        kind: ConflictKind,
        first: Handle,
        second: Handle,
    },

    /// The merge would leave more than one pair of duplicate families.
    #[error(
        "merging into {person} would require {collapses} family collapses at once; \
         merge those families individually first"
    )]
    MultipleFamilyCollapse { person: Handle, collapses: usize },

    /// Cascading merges nested deeper than the configured bound.
    #[error("merge cascade exceeded depth {depth}")]
    CascadeDepthExceeded { depth: usize },

    /// Both casualty parents were aligned to the same survivor slot.
    #[error("both parents of family {family} map to the same slot")]
    InvalidAlignment { family: Handle },

    /// A null handle was passed in.
    #[error("cannot merge a null handle")]
    NullHandle,

    /// Survivor and casualty are the same record.
    #[error("cannot merge {0} with itself")]
    SameHandle(Handle),

    /// A record to merge does not exist.
    #[error("{kind} not found: {handle}")]
    NotFound { kind: EntityKind, handle: Handle },

    /// Failure surfaced from the datastore.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl MergeError {
    /// Returns `true` for errors detected before the transaction wrote
    /// anything.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            MergeError::Conflict { .. }
                | MergeError::InvalidAlignment { .. }
                | MergeError::NullHandle
                | MergeError::SameHandle(_)
                | MergeError::NotFound { .. }
        )
    }

    pub(crate) fn conflict(kind: ConflictKind, first: Handle, second: Handle) -> Self {
        MergeError::Conflict {
            kind,
            first,
            second,
        }
    }
}

/// Result alias for merge operations.
pub type MergeResult<T> = Result<T, MergeError>;

/// Errors loading a [`MergeConfig`](crate::MergeConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid merge config: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_message_is_actionable() {
        let err = MergeError::conflict(ConflictKind::Spousal, Handle::new(), Handle::new());
        let msg = err.to_string();
        assert!(msg.contains("spouses"));
        assert!(msg.contains("break that relationship"));
    }

    #[test]
    fn validation_classification() {
        assert!(MergeError::NullHandle.is_validation());
        assert!(MergeError::conflict(ConflictKind::ParentChild, Handle::new(), Handle::new())
            .is_validation());
        assert!(!MergeError::MultipleFamilyCollapse {
            person: Handle::new(),
            collapses: 2
        }
        .is_validation());
        assert!(!MergeError::Storage(StoreError::NullHandle).is_validation());
    }

    #[test]
    fn storage_errors_convert() {
        let err: MergeError = StoreError::LockPoisoned("boom".into()).into();
        assert!(matches!(err, MergeError::Storage(_)));
    }
}
