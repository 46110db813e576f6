//! Person merge: fold the casualty into the survivor, repoint everything
//! that referenced the casualty, then collapse any family pair that became
//! a duplicate couple.

use std::collections::BTreeSet;

use kin_types::{EntityKind, Handle};
use tracing::debug;

use crate::collapse::collapse_duplicates;
use crate::content::merge_person_content;
use crate::error::{MergeError, MergeResult};
use crate::session::Session;
use crate::validator::check_person_pair;

/// Merge person `casualty` into person `survivor` inside the session's
/// transaction. May cascade into one family merge.
pub(crate) fn merge_persons(
    session: &mut Session<'_>,
    survivor: Handle,
    casualty: Handle,
) -> MergeResult<()> {
    session.enter()?;
    let result = merge_persons_inner(session, survivor, casualty);
    session.leave();
    result
}

fn merge_persons_inner(
    session: &mut Session<'_>,
    survivor: Handle,
    casualty: Handle,
) -> MergeResult<()> {
    if survivor == casualty {
        return Err(MergeError::SameHandle(survivor));
    }
    let mut kept = session.load_person(&survivor)?;
    let gone = session.load_person(&casualty)?;
    check_person_pair(&kept, &gone)?;
    debug!(
        survivor = %survivor.short_id(),
        casualty = %casualty.short_id(),
        depth = session.depth(),
        "merging persons"
    );

    merge_person_content(&mut kept, &gone);
    for fh in &gone.family_list {
        kept.add_family_handle(*fh);
    }
    for fh in &gone.parent_family_list {
        kept.add_parent_family_handle(*fh);
    }
    session.txn.commit_person(kept)?;

    // Families whose father or mother slot now names the survivor.
    let mut respoused = BTreeSet::new();
    for link in session.txn.find_backlink_handles(&casualty)? {
        match link.kind {
            EntityKind::Person => {
                if link.holder == casualty || link.holder == survivor {
                    continue;
                }
                let mut holder = session.load_person(&link.holder)?;
                if holder.replace_handle_reference(EntityKind::Person, casualty, survivor) {
                    session.txn.commit_person(holder)?;
                }
            }
            EntityKind::Family => {
                let mut holder = session.load_family(&link.holder)?;
                let was_parent = holder.is_parent(&casualty);
                if holder.replace_handle_reference(EntityKind::Person, casualty, survivor) {
                    session.txn.commit_family(holder)?;
                    session.touch_family(link.holder);
                    if was_parent {
                        respoused.insert(link.holder);
                    }
                }
            }
        }
    }

    if session.config.collapse_duplicate_families {
        collapse_duplicates(session, &[survivor], &respoused)?;
    }

    session.txn.remove_person(&casualty)?;
    session.record_merged(casualty);
    Ok(())
}
