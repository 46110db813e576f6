//! Duplicate-couple collapse, run after a person merge rewrites parent
//! slots and after a family merge adopts a parent into an empty slot.

use std::collections::{BTreeMap, BTreeSet};

use kin_types::{Couple, Handle};
use tracing::debug;

use crate::alignment::SlotAlignment;
use crate::error::{MergeError, MergeResult};
use crate::family;
use crate::session::Session;

/// Scan the families of `anchors` (plus `fresh` itself) for couples that
/// now appear more than once, and merge the single resulting pair.
///
/// Only groups containing a `fresh` family count. Families held by an
/// enclosing family merge are already being merged into one another, so a
/// group needs one collapse per unprotected member. Anything other than
/// exactly one collapse fails with [`MergeError::MultipleFamilyCollapse`].
pub(crate) fn collapse_duplicates(
    session: &mut Session<'_>,
    anchors: &[Handle],
    fresh: &BTreeSet<Handle>,
) -> MergeResult<()> {
    let Some(&anchor) = anchors.first() else {
        return Ok(());
    };
    if fresh.is_empty() {
        return Ok(());
    }

    let mut scanned: BTreeSet<Handle> = fresh.clone();
    for person in anchors {
        scanned.extend(session.load_person(person)?.family_list);
    }
    let mut couples: BTreeMap<Couple, Vec<Handle>> = BTreeMap::new();
    for fh in &scanned {
        if let Some(family) = session.txn.get_family(fh)? {
            if let Some(couple) = family.couple() {
                couples.entry(couple).or_default().push(family.handle);
            }
        }
    }

    let groups: Vec<Vec<Handle>> = couples
        .into_values()
        .filter(|members| members.len() > 1)
        .filter(|members| members.iter().any(|f| fresh.contains(f)))
        .filter(|members| !members.iter().all(|f| session.is_protected(f)))
        .collect();
    if groups.is_empty() {
        return Ok(());
    }

    let collapses: usize = groups.iter().map(|g| pending_collapses(session, g)).sum();
    let pair = match groups.as_slice() {
        [members] if collapses == 1 => pick_pair(session, fresh, members),
        _ => None,
    };
    let Some((keep, fold)) = pair else {
        return Err(MergeError::MultipleFamilyCollapse {
            person: anchor,
            collapses,
        });
    };

    debug!(
        survivor = %keep.short_id(),
        casualty = %fold.short_id(),
        "collapsing duplicate family"
    );
    let (kept, gone) = (session.load_family(&keep)?, session.load_family(&fold)?);
    let alignment = SlotAlignment::detect(&kept, &gone);
    family::merge_families(session, keep, fold, alignment)
}

fn pending_collapses(session: &Session<'_>, members: &[Handle]) -> usize {
    let held = members.iter().filter(|f| session.is_protected(f)).count();
    members.len() - held.max(1)
}

/// A family held by an enclosing merge survives; otherwise one whose
/// couple was already in place does.
fn pick_pair(
    session: &Session<'_>,
    fresh: &BTreeSet<Handle>,
    members: &[Handle],
) -> Option<(Handle, Handle)> {
    let (held, free): (Vec<Handle>, Vec<Handle>) =
        members.iter().copied().partition(|f| session.is_protected(f));
    match free.as_slice() {
        [fold] => session.outermost_protected(&held).map(|keep| (keep, *fold)),
        [a, b] if held.is_empty() => {
            if fresh.contains(a) && !fresh.contains(b) {
                Some((*b, *a))
            } else {
                Some((*a, *b))
            }
        }
        _ => None,
    }
}
