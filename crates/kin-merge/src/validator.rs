//! Relationship checks that refuse illegal person merges.
//!
//! Everything here is pure: it looks only at the two records passed in and
//! runs before the merge writes anything.

use kin_types::{Handle, Person};

use crate::error::{ConflictKind, MergeError, MergeResult};

fn intersects(a: &[Handle], b: &[Handle]) -> bool {
    a.iter().any(|h| b.contains(h))
}

/// The two people are father and mother of some shared family.
pub fn has_spousal_overlap(p1: &Person, p2: &Person) -> bool {
    intersects(&p1.family_list, &p2.family_list)
}

/// One person is a parent in a family where the other is a child.
pub fn has_parent_child_overlap(p1: &Person, p2: &Person) -> bool {
    intersects(&p1.family_list, &p2.parent_family_list)
        || intersects(&p2.family_list, &p1.parent_family_list)
}

/// Check spouses first, then parent/child.
pub fn check_person_pair(p1: &Person, p2: &Person) -> MergeResult<()> {
    if has_spousal_overlap(p1, p2) {
        return Err(MergeError::conflict(ConflictKind::Spousal, p1.handle, p2.handle));
    }
    if has_parent_child_overlap(p1, p2) {
        return Err(MergeError::conflict(
            ConflictKind::ParentChild,
            p1.handle,
            p2.handle,
        ));
    }
    Ok(())
}
