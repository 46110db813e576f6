//! Reference plumbing shared by all record types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::handle::Handle;

/// The table a handle lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Person,
    Family,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Person => write!(f, "person"),
            EntityKind::Family => write!(f, "family"),
        }
    }
}

/// A typed handle held by a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandleRef {
    pub kind: EntityKind,
    pub handle: Handle,
}

impl HandleRef {
    pub fn person(handle: Handle) -> Self {
        Self {
            kind: EntityKind::Person,
            handle,
        }
    }

    pub fn family(handle: Handle) -> Self {
        Self {
            kind: EntityKind::Family,
            handle,
        }
    }
}

/// Rewrite `old` to `new` inside an ordered handle list without ever
/// producing two entries for `new`.
///
/// When `new` is already present every `old` entry is removed; otherwise the
/// first `old` entry takes `new`'s place and later `old` entries are dropped.
/// Returns `true` if the list changed.
pub fn replace_in_list(list: &mut Vec<Handle>, old: Handle, new: Handle) -> bool {
    if old == new || !list.contains(&old) {
        return false;
    }
    let mut seen_new = list.contains(&new);
    list.retain_mut(|h| {
        if *h != old {
            return true;
        }
        if seen_new {
            false
        } else {
            *h = new;
            seen_new = true;
            true
        }
    });
    true
}
