//! Family merge: reconcile the parent slots, move the children over, and
//! repoint everything that referenced the casualty family.

use std::collections::BTreeSet;

use kin_store::Datastore;
use kin_types::{EntityKind, Family, Handle, Person};
use tracing::debug;

use crate::alignment::{ParentSlot, SlotAlignment};
use crate::collapse::collapse_duplicates;
use crate::content::merge_content;
use crate::error::{ConflictKind, MergeError, MergeResult};
use crate::person;
use crate::session::Session;
use crate::validator::check_person_pair;

/// Merge family `casualty` into family `survivor` inside the session's
/// transaction. Both stay protected from nested collapses until this
/// returns.
pub(crate) fn merge_families(
    session: &mut Session<'_>,
    survivor: Handle,
    casualty: Handle,
    alignment: SlotAlignment,
) -> MergeResult<()> {
    session.enter()?;
    session.protect([survivor, casualty]);
    let result = merge_families_inner(session, survivor, casualty, alignment);
    session.unprotect();
    session.leave();
    result
}

fn merge_families_inner(
    session: &mut Session<'_>,
    survivor: Handle,
    casualty: Handle,
    alignment: SlotAlignment,
) -> MergeResult<()> {
    if survivor == casualty {
        return Err(MergeError::SameHandle(survivor));
    }
    debug!(
        survivor = %survivor.short_id(),
        casualty = %casualty.short_id(),
        crossed = !alignment.is_straight(),
        depth = session.depth(),
        "merging families"
    );

    let mut adopted = false;
    for slot in ParentSlot::BOTH {
        // Earlier slots may have rewritten either family.
        let kept = session.load_family(&survivor)?;
        let gone = session.load_family(&casualty)?;
        let incoming = alignment.casualty_for(slot, &gone)?;
        match (slot.get(&kept), incoming) {
            (Some(keep), Some(other)) if keep != other => {
                person::merge_persons(session, keep, other)?;
            }
            (None, Some(other)) if !kept.is_parent(&other) => {
                if kept.has_child(&other) {
                    return Err(MergeError::conflict(ConflictKind::ParentChild, other, survivor));
                }
                let mut kept = kept;
                slot.set(&mut kept, other);
                session.txn.commit_family(kept)?;
                adopted = true;
            }
            _ => {}
        }
    }

    // A filled slot can give the survivor a couple some third family has.
    if adopted && session.config.collapse_duplicate_families {
        let kept = session.load_family(&survivor)?;
        let parents: Vec<Handle> = [kept.father, kept.mother].into_iter().flatten().collect();
        collapse_duplicates(session, &parents, &BTreeSet::from([survivor]))?;
    }

    let mut kept = session.load_family(&survivor)?;
    let gone = session.load_family(&casualty)?;
    merge_content(&mut kept.content, gone.content);

    for child_ref in gone.child_ref_list {
        let child = child_ref.child;
        if kept.has_child(&child) {
            continue;
        }
        if kept.is_parent(&child) {
            return Err(MergeError::conflict(ConflictKind::ParentChild, child, survivor));
        }
        kept.child_ref_list.push(child_ref);
        let mut rec = session.load_person(&child)?;
        if rec.replace_handle_reference(EntityKind::Family, casualty, survivor) {
            session.txn.commit_person(rec)?;
        }
    }
    session.txn.commit_family(kept)?;

    for link in session.txn.find_backlinks_of_kind(&casualty, EntityKind::Person)? {
        let mut holder = session.load_person(&link.holder)?;
        if holder.replace_handle_reference(EntityKind::Family, casualty, survivor) {
            session.txn.commit_person(holder)?;
        }
    }

    session.txn.remove_family(&casualty)?;
    session.record_collapsed(casualty);
    session.touch_family(survivor);
    Ok(())
}

/// Checks a top-level family merge must pass before anything is written.
pub(crate) fn prevalidate(
    store: &dyn Datastore,
    survivor: &Family,
    casualty: &Family,
    alignment: SlotAlignment,
) -> MergeResult<()> {
    alignment.validate(casualty)?;

    let mut final_parents = BTreeSet::new();
    for slot in ParentSlot::BOTH {
        let keep = slot.get(survivor);
        let incoming = alignment.casualty_for(slot, casualty)?;
        match (keep, incoming) {
            (Some(k), Some(o)) if k != o => {
                let (kp, op) = (fetch_person(store, &k)?, fetch_person(store, &o)?);
                check_person_pair(&kp, &op)?;
            }
            (None, Some(o)) if survivor.has_child(&o) => {
                return Err(MergeError::conflict(
                    ConflictKind::ParentChild,
                    o,
                    survivor.handle,
                ));
            }
            _ => {}
        }
        final_parents.extend(keep.or(incoming));
    }

    for child in casualty.child_handles() {
        if final_parents.contains(&child) {
            return Err(MergeError::conflict(
                ConflictKind::ParentChild,
                child,
                survivor.handle,
            ));
        }
    }
    Ok(())
}

fn fetch_person(store: &dyn Datastore, handle: &Handle) -> MergeResult<Person> {
    store.get_person(handle)?.ok_or(MergeError::NotFound {
        kind: EntityKind::Person,
        handle: *handle,
    })
}
