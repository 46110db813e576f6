//! Small family trees for tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use kin_store::{DatastoreSnapshot, InMemoryDatastore};
use kin_types::{ChildRef, Family, Handle, Name, Person};

/// Builds a consistent tree: both sides of every link are wired.
#[derive(Default)]
pub(crate) struct TreeBuilder {
    persons: BTreeMap<Handle, Person>,
    families: BTreeMap<Handle, Family>,
}

impl TreeBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn person(&mut self, id: &str) -> Handle {
        let p = Person::new(id, Name::new(id, "Test"));
        let h = p.handle;
        self.persons.insert(h, p);
        h
    }

    pub(crate) fn family(
        &mut self,
        id: &str,
        father: Option<Handle>,
        mother: Option<Handle>,
        children: &[Handle],
    ) -> Handle {
        let mut f = Family::new(id);
        f.father = father;
        f.mother = mother;
        let h = f.handle;
        for parent in father.iter().chain(mother.iter()) {
            self.person_mut(*parent).add_family_handle(h);
        }
        for child in children {
            f.add_child_ref(ChildRef::birth(*child));
            self.person_mut(*child).add_parent_family_handle(h);
        }
        self.families.insert(h, f);
        h
    }

    pub(crate) fn person_mut(&mut self, handle: Handle) -> &mut Person {
        self.persons
            .get_mut(&handle)
            .expect("fixture person exists")
    }

    pub(crate) fn family_mut(&mut self, handle: Handle) -> &mut Family {
        self.families
            .get_mut(&handle)
            .expect("fixture family exists")
    }

    pub(crate) fn build(self) -> Arc<InMemoryDatastore> {
        Arc::new(InMemoryDatastore::from_snapshot(DatastoreSnapshot {
            persons: self.persons,
            families: self.families,
            retired: Default::default(),
        }))
    }
}
