//! Referential-integrity checks over a full set of records.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use kin_types::{Couple, EntityKind, Family, Handle, Person};
use serde::{Deserialize, Serialize};

/// One violation found by an integrity check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegrityIssue {
    /// A record holds a handle that names no stored record of that kind.
    DanglingReference {
        holder_kind: EntityKind,
        holder: Handle,
        target_kind: EntityKind,
        target: Handle,
    },
    /// A family lists the same person as a parent and as a child.
    ParentIsChild { family: Handle, person: Handle },
    /// A family names a parent whose family list does not include it, or
    /// the other way round.
    UnmatchedSpouseLink { family: Handle, person: Handle },
    /// A family lists a child whose parent-family list does not include it,
    /// or the other way round.
    UnmatchedChildLink { family: Handle, person: Handle },
    /// Two or more families share the same unordered couple. A single
    /// parent counts as a couple with an empty slot.
    DuplicateCouple {
        couple: Couple,
        families: Vec<Handle>,
    },
    /// The backlink index disagrees with the records for this target.
    StaleBacklinkIndex { target: Handle },
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityIssue::DanglingReference {
                holder_kind,
                holder,
                target_kind,
                target,
            } => write!(
                f,
                "{holder_kind} {holder} references missing {target_kind} {target}"
            ),
            IntegrityIssue::ParentIsChild { family, person } => {
                write!(f, "family {family} has {person} as both parent and child")
            }
            IntegrityIssue::UnmatchedSpouseLink { family, person } => {
                write!(f, "spouse link between family {family} and {person} is one-sided")
            }
            IntegrityIssue::UnmatchedChildLink { family, person } => {
                write!(f, "child link between family {family} and {person} is one-sided")
            }
            IntegrityIssue::DuplicateCouple { couple, families } => write!(
                f,
                "{} families share the couple {} / {}",
                families.len(),
                slot(&couple.0),
                slot(&couple.1)
            ),
            IntegrityIssue::StaleBacklinkIndex { target } => {
                write!(f, "backlink index is stale for {target}")
            }
        }
    }
}

fn slot(parent: &Option<Handle>) -> String {
    parent.map_or_else(|| "-".to_string(), |h| h.to_string())
}

/// Check dangling references, parent-is-child cycles, one-sided links, and
/// duplicate couples.
pub fn check_records(
    persons: &BTreeMap<Handle, Person>,
    families: &BTreeMap<Handle, Family>,
) -> Vec<IntegrityIssue> {
    let mut issues = Vec::new();
    let exists = |kind: EntityKind, h: &Handle| match kind {
        EntityKind::Person => persons.contains_key(h),
        EntityKind::Family => families.contains_key(h),
    };

    for p in persons.values() {
        for r in p.references() {
            if !exists(r.kind, &r.handle) {
                issues.push(IntegrityIssue::DanglingReference {
                    holder_kind: EntityKind::Person,
                    holder: p.handle,
                    target_kind: r.kind,
                    target: r.handle,
                });
            }
        }
        for fh in &p.family_list {
            if let Some(f) = families.get(fh) {
                if !f.is_parent(&p.handle) {
                    issues.push(IntegrityIssue::UnmatchedSpouseLink {
                        family: *fh,
                        person: p.handle,
                    });
                }
            }
        }
        for fh in &p.parent_family_list {
            if let Some(f) = families.get(fh) {
                if !f.has_child(&p.handle) {
                    issues.push(IntegrityIssue::UnmatchedChildLink {
                        family: *fh,
                        person: p.handle,
                    });
                }
            }
        }
    }

    let mut couples: BTreeMap<Couple, Vec<Handle>> = BTreeMap::new();
    for f in families.values() {
        for r in f.references() {
            if !exists(r.kind, &r.handle) {
                issues.push(IntegrityIssue::DanglingReference {
                    holder_kind: EntityKind::Family,
                    holder: f.handle,
                    target_kind: r.kind,
                    target: r.handle,
                });
            }
        }
        let parents: BTreeSet<Handle> = f.father.iter().chain(f.mother.iter()).copied().collect();
        for parent in &parents {
            if f.has_child(parent) {
                issues.push(IntegrityIssue::ParentIsChild {
                    family: f.handle,
                    person: *parent,
                });
            }
            if let Some(p) = persons.get(parent) {
                if !p.family_list.contains(&f.handle) {
                    issues.push(IntegrityIssue::UnmatchedSpouseLink {
                        family: f.handle,
                        person: *parent,
                    });
                }
            }
        }
        for child in f.child_handles() {
            if let Some(p) = persons.get(&child) {
                if !p.parent_family_list.contains(&f.handle) {
                    issues.push(IntegrityIssue::UnmatchedChildLink {
                        family: f.handle,
                        person: child,
                    });
                }
            }
        }
        if let Some(couple) = f.couple() {
            couples.entry(couple).or_default().push(f.handle);
        }
    }

    for (couple, families) in couples {
        if families.len() > 1 {
            issues.push(IntegrityIssue::DuplicateCouple { couple, families });
        }
    }
    issues
}
