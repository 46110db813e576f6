use serde::{Deserialize, Serialize};

use crate::content::RecordContent;
use crate::handle::Handle;
use crate::reference::{EntityKind, HandleRef};

/// How a child relates to one of the parents of a family.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChildRelation {
    None,
    #[default]
    Birth,
    Adopted,
    Stepchild,
    Sponsored,
    Foster,
    Unknown,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FamilyRelType {
    Married,
    Unmarried,
    CivilUnion,
    #[default]
    Unknown,
}

/// A family's link to one child.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildRef {
    pub child: Handle,
    #[serde(default)]
    pub father_relation: ChildRelation,
    #[serde(default)]
    pub mother_relation: ChildRelation,
    #[serde(default)]
    pub private: bool,
}

impl ChildRef {
    /// A birth child of both parents.
    pub fn birth(child: Handle) -> Self {
        Self {
            child,
            father_relation: ChildRelation::Birth,
            mother_relation: ChildRelation::Birth,
            private: false,
        }
    }

    pub fn with_relations(child: Handle, father: ChildRelation, mother: ChildRelation) -> Self {
        Self {
            child,
            father_relation: father,
            mother_relation: mother,
            private: false,
        }
    }
}

/// Unordered parent pair as returned by [`Family::couple`]. `None` sorts
/// first, so a single parent always sits in the second position.
pub type Couple = (Option<Handle>, Option<Handle>);

/// A couple (either slot may be empty) and their children.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Family {
    pub handle: Handle,
    /// User-visible identifier such as "F0007".
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father: Option<Handle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mother: Option<Handle>,
    #[serde(default)]
    pub child_ref_list: Vec<ChildRef>,
    #[serde(default)]
    pub relationship: FamilyRelType,
    #[serde(default)]
    pub content: RecordContent,
}

impl Family {
    /// Create an empty family with a fresh handle.
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_handle(Handle::new(), id)
    }

    pub fn with_handle(handle: Handle, id: impl Into<String>) -> Self {
        Self {
            handle,
            id: id.into(),
            father: None,
            mother: None,
            child_ref_list: Vec::new(),
            relationship: FamilyRelType::Unknown,
            content: RecordContent::default(),
        }
    }

    /// The unordered (father, mother) pair, with empty slots included, so
    /// (a, none) and (none, a) are the same couple. A family with no parent
    /// at all has no couple.
    pub fn couple(&self) -> Option<Couple> {
        match (self.father, self.mother) {
            (None, None) => None,
            (f, m) if f <= m => Some((f, m)),
            (f, m) => Some((m, f)),
        }
    }

    pub fn is_parent(&self, person: &Handle) -> bool {
        self.father.as_ref() == Some(person) || self.mother.as_ref() == Some(person)
    }

    pub fn has_child(&self, person: &Handle) -> bool {
        self.child_ref_list.iter().any(|c| &c.child == person)
    }

    pub fn child_handles(&self) -> Vec<Handle> {
        self.child_ref_list.iter().map(|c| c.child).collect()
    }

    /// Append a child link unless the child is already listed.
    pub fn add_child_ref(&mut self, child_ref: ChildRef) -> bool {
        if self.has_child(&child_ref.child) {
            return false;
        }
        self.child_ref_list.push(child_ref);
        true
    }

    pub fn remove_child_handle(&mut self, child: &Handle) -> bool {
        let before = self.child_ref_list.len();
        self.child_ref_list.retain(|c| &c.child != child);
        before != self.child_ref_list.len()
    }

    /// Every handle this family holds: father, mother, then children.
    pub fn references(&self) -> Vec<HandleRef> {
        let mut refs = Vec::with_capacity(self.child_ref_list.len() + 2);
        refs.extend(self.father.map(HandleRef::person));
        refs.extend(self.mother.map(HandleRef::person));
        refs.extend(self.child_ref_list.iter().map(|c| HandleRef::person(c.child)));
        refs
    }

    pub fn has_handle_reference(&self, kind: EntityKind, handle: &Handle) -> bool {
        match kind {
            EntityKind::Person => self.is_parent(handle) || self.has_child(handle),
            EntityKind::Family => false,
        }
    }

    /// Rewrite every reference to person `old` into a reference to `new`.
    ///
    /// If `new` is already a child, `old`'s child link is dropped rather
    /// than duplicated; otherwise it keeps its position and relation tags.
    /// Returns `true` if anything changed.
    pub fn replace_handle_reference(&mut self, kind: EntityKind, old: Handle, new: Handle) -> bool {
        if kind != EntityKind::Person || old == new {
            return false;
        }
        let mut changed = false;
        if self.father == Some(old) {
            self.father = Some(new);
            changed = true;
        }
        if self.mother == Some(old) {
            self.mother = Some(new);
            changed = true;
        }
        if self.has_child(&old) {
            if self.has_child(&new) {
                self.remove_child_handle(&old);
            } else {
                let mut seen = false;
                self.child_ref_list.retain_mut(|c| {
                    if c.child != old {
                        return true;
                    }
                    if seen {
                        return false;
                    }
                    c.child = new;
                    seen = true;
                    true
                });
            }
            changed = true;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn couple_is_unordered() {
        let (a, b) = (Handle::new(), Handle::new());
        let mut f1 = Family::new("F1");
        f1.father = Some(a);
        f1.mother = Some(b);
        let mut f2 = Family::new("F2");
        f2.father = Some(b);
        f2.mother = Some(a);
        assert_eq!(f1.couple(), f2.couple());
        assert!(f1.couple().is_some());
    }

    #[test]
    fn single_parent_couple_ignores_slot() {
        let a = Handle::new();
        let mut f1 = Family::new("F1");
        f1.father = Some(a);
        let mut f2 = Family::new("F2");
        f2.mother = Some(a);
        assert_eq!(f1.couple(), Some((None, Some(a))));
        assert_eq!(f1.couple(), f2.couple());
    }

    #[test]
    fn parentless_family_has_no_couple() {
        assert_eq!(Family::new("F1").couple(), None);
    }

    #[test]
    fn add_child_ref_ignores_duplicates() {
        let mut f = Family::new("F1");
        let c = Handle::new();
        assert!(f.add_child_ref(ChildRef::birth(c)));
        assert!(!f.add_child_ref(ChildRef::birth(c)));
        assert_eq!(f.child_handles(), vec![c]);
    }

    #[test]
    fn references_in_slot_order() {
        let (a, b, c) = (Handle::new(), Handle::new(), Handle::new());
        let mut f = Family::new("F1");
        f.father = Some(a);
        f.mother = Some(b);
        f.add_child_ref(ChildRef::birth(c));
        assert_eq!(
            f.references(),
            vec![HandleRef::person(a), HandleRef::person(b), HandleRef::person(c)]
        );
    }

    #[test]
    fn replace_parent_slot() {
        let (old, new) = (Handle::new(), Handle::new());
        let mut f = Family::new("F1");
        f.mother = Some(old);
        assert!(f.replace_handle_reference(EntityKind::Person, old, new));
        assert_eq!(f.mother, Some(new));
    }

    #[test]
    fn replace_child_keeps_relations() {
        let (old, new) = (Handle::new(), Handle::new());
        let mut f = Family::new("F1");
        f.add_child_ref(ChildRef::with_relations(
            old,
            ChildRelation::Adopted,
            ChildRelation::Birth,
        ));
        assert!(f.replace_handle_reference(EntityKind::Person, old, new));
        assert_eq!(f.child_ref_list[0].child, new);
        assert_eq!(f.child_ref_list[0].father_relation, ChildRelation::Adopted);
    }

    #[test]
    fn replace_child_elides_duplicate() {
        let (old, new) = (Handle::new(), Handle::new());
        let mut f = Family::new("F1");
        f.add_child_ref(ChildRef::birth(new));
        f.add_child_ref(ChildRef::birth(old));
        assert!(f.replace_handle_reference(EntityKind::Person, old, new));
        assert_eq!(f.child_handles(), vec![new]);
    }

    #[test]
    fn replace_family_kind_is_noop() {
        let mut f = Family::new("F1");
        let h = Handle::new();
        f.father = Some(h);
        assert!(!f.replace_handle_reference(EntityKind::Family, h, Handle::new()));
        assert_eq!(f.father, Some(h));
    }
}
