use serde::{Deserialize, Serialize};

use crate::content::{Name, RecordContent};
use crate::handle::Handle;
use crate::reference::{replace_in_list, EntityKind, HandleRef};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
    #[default]
    Unknown,
}

/// A link from one person to another (godparent, witness, ...).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRef {
    pub person: Handle,
    pub relationship: String,
    #[serde(default)]
    pub private: bool,
}

impl PersonRef {
    pub fn new(person: Handle, relationship: impl Into<String>) -> Self {
        Self {
            person,
            relationship: relationship.into(),
            private: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrdinanceKind {
    Baptism,
    Endowment,
    SealedToParents,
    SealedToSpouse,
    Confirmation,
}

/// An auxiliary ordinance record. Sealings point at the family they seal
/// the person into, which makes them backlink holders for that family.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ordinance {
    pub kind: OrdinanceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<Handle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temple: Option<String>,
    #[serde(default)]
    pub private: bool,
}

impl Ordinance {
    pub fn new(kind: OrdinanceKind) -> Self {
        Self {
            kind,
            family: None,
            date: None,
            temple: None,
            private: false,
        }
    }

    pub fn sealed_to(mut self, family: Handle) -> Self {
        self.family = Some(family);
        self
    }
}

/// An individual.
///
/// `family_list` holds the families in which this person is a father or
/// mother; `parent_family_list` holds the families in which this person is
/// a child. Both are ordered and free of duplicates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub handle: Handle,
    /// User-visible identifier such as "I0042".
    pub id: String,
    pub primary_name: Name,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub alternate_names: Vec<Name>,
    #[serde(default)]
    pub family_list: Vec<Handle>,
    #[serde(default)]
    pub parent_family_list: Vec<Handle>,
    #[serde(default)]
    pub associations: Vec<PersonRef>,
    #[serde(default)]
    pub ordinances: Vec<Ordinance>,
    #[serde(default)]
    pub content: RecordContent,
}

impl Person {
    /// Create a person with a fresh handle.
    pub fn new(id: impl Into<String>, primary_name: Name) -> Self {
        Self::with_handle(Handle::new(), id, primary_name)
    }

    pub fn with_handle(handle: Handle, id: impl Into<String>, primary_name: Name) -> Self {
        Self {
            handle,
            id: id.into(),
            primary_name,
            gender: Gender::Unknown,
            alternate_names: Vec::new(),
            family_list: Vec::new(),
            parent_family_list: Vec::new(),
            associations: Vec::new(),
            ordinances: Vec::new(),
            content: RecordContent::default(),
        }
    }

    /// Add a spouse family, ignoring duplicates.
    pub fn add_family_handle(&mut self, family: Handle) {
        if !self.family_list.contains(&family) {
            self.family_list.push(family);
        }
    }

    /// Add a parent family, ignoring duplicates.
    pub fn add_parent_family_handle(&mut self, family: Handle) {
        if !self.parent_family_list.contains(&family) {
            self.parent_family_list.push(family);
        }
    }

    /// Every handle this person holds, in field order. A handle held in two
    /// fields appears twice.
    pub fn references(&self) -> Vec<HandleRef> {
        let mut refs = Vec::new();
        refs.extend(self.family_list.iter().copied().map(HandleRef::family));
        refs.extend(self.parent_family_list.iter().copied().map(HandleRef::family));
        refs.extend(self.associations.iter().map(|a| HandleRef::person(a.person)));
        refs.extend(
            self.ordinances
                .iter()
                .filter_map(|o| o.family)
                .map(HandleRef::family),
        );
        refs
    }

    pub fn has_handle_reference(&self, kind: EntityKind, handle: &Handle) -> bool {
        match kind {
            EntityKind::Family => {
                self.family_list.contains(handle)
                    || self.parent_family_list.contains(handle)
                    || self.ordinances.iter().any(|o| o.family.as_ref() == Some(handle))
            }
            EntityKind::Person => self.associations.iter().any(|a| &a.person == handle),
        }
    }

    /// Rewrite every reference to `old` into a reference to `new`.
    ///
    /// Family lists never end up holding `new` twice. Associations that
    /// would point at this person itself are dropped. Returns `true` if
    /// anything changed.
    pub fn replace_handle_reference(&mut self, kind: EntityKind, old: Handle, new: Handle) -> bool {
        if old == new {
            return false;
        }
        match kind {
            EntityKind::Family => {
                let mut changed = replace_in_list(&mut self.family_list, old, new);
                changed |= replace_in_list(&mut self.parent_family_list, old, new);
                for ordinance in &mut self.ordinances {
                    if ordinance.family == Some(old) {
                        ordinance.family = Some(new);
                        changed = true;
                    }
                }
                changed
            }
            EntityKind::Person => {
                let own = self.handle;
                let before = self.associations.clone();
                for assoc in &mut self.associations {
                    if assoc.person == old {
                        assoc.person = new;
                    }
                }
                self.associations.retain(|a| a.person != own);
                dedup_in_place(&mut self.associations);
                before != self.associations
            }
        }
    }
}

/// Remove later exact duplicates, keeping first occurrences in order.
fn dedup_in_place<T: PartialEq + Clone>(items: &mut Vec<T>) {
    let mut kept: Vec<T> = Vec::with_capacity(items.len());
    for item in items.drain(..) {
        if !kept.contains(&item) {
            kept.push(item);
        }
    }
    *items = kept;
}
