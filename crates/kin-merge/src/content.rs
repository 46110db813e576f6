//! How the content of two records combines.
//!
//! Single-valued fields keep the survivor's value. List fields are merged
//! entry by entry: each casualty entry is compared against the survivor's
//! entries, and the first one that is not [`Equivalence::Different`]
//! decides what happens to it.

use kin_types::{Attribute, Event, MediaRef, Note, Ordinance, Person, RecordContent};

/// How two content entries relate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Equivalence {
    /// Same in every field. The casualty entry is dropped.
    Identical,
    /// Same identity, different detail. The casualty entry is absorbed into
    /// the survivor entry.
    Equal,
    /// Unrelated entries. The casualty entry is appended.
    Different,
}

/// A list entry that can be compared with and folded into a peer.
pub trait Mergeable: Sized {
    fn equivalence(&self, other: &Self) -> Equivalence;

    /// Fold an [`Equivalence::Equal`] peer into `self`.
    fn absorb(&mut self, other: Self);
}

/// Merge `casualty` entries into `survivor`, preserving survivor order and
/// appending new entries in casualty order.
pub fn merge_list<T: Mergeable>(survivor: &mut Vec<T>, casualty: Vec<T>) {
    for entry in casualty {
        let matched = survivor
            .iter()
            .enumerate()
            .find_map(|(i, existing)| match existing.equivalence(&entry) {
                Equivalence::Different => None,
                eq => Some((i, eq)),
            });
        match matched {
            Some((_, Equivalence::Identical)) => {}
            Some((i, _)) => survivor[i].absorb(entry),
            None => survivor.push(entry),
        }
    }
}

/// Append strings not already present.
pub fn union_strings(survivor: &mut Vec<String>, casualty: Vec<String>) {
    for s in casualty {
        if !survivor.contains(&s) {
            survivor.push(s);
        }
    }
}

fn classify<T: PartialEq>(a: &T, b: &T, same_identity: bool) -> Equivalence {
    if !same_identity {
        Equivalence::Different
    } else if a == b {
        Equivalence::Identical
    } else {
        Equivalence::Equal
    }
}

impl Mergeable for Note {
    fn equivalence(&self, other: &Self) -> Equivalence {
        classify(self, other, self.text == other.text)
    }

    fn absorb(&mut self, other: Self) {
        self.private |= other.private;
        union_strings(&mut self.tags, other.tags);
    }
}

impl Mergeable for Attribute {
    fn equivalence(&self, other: &Self) -> Equivalence {
        classify(self, other, self.kind == other.kind && self.value == other.value)
    }

    fn absorb(&mut self, other: Self) {
        self.private |= other.private;
        union_strings(&mut self.citations, other.citations);
        union_strings(&mut self.notes, other.notes);
    }
}

impl Mergeable for MediaRef {
    fn equivalence(&self, other: &Self) -> Equivalence {
        classify(self, other, self.path == other.path && self.region == other.region)
    }

    fn absorb(&mut self, other: Self) {
        self.private |= other.private;
        merge_list(&mut self.attributes, other.attributes);
        union_strings(&mut self.citations, other.citations);
    }
}

impl Mergeable for Event {
    fn equivalence(&self, other: &Self) -> Equivalence {
        classify(
            self,
            other,
            self.kind == other.kind && self.date == other.date && self.place == other.place,
        )
    }

    fn absorb(&mut self, other: Self) {
        self.private |= other.private;
        if self.description.is_empty() {
            self.description = other.description;
        }
        union_strings(&mut self.citations, other.citations);
        union_strings(&mut self.notes, other.notes);
    }
}

impl Mergeable for Ordinance {
    fn equivalence(&self, other: &Self) -> Equivalence {
        let same = self.kind == other.kind
            && self.family == other.family
            && self.date == other.date
            && self.temple == other.temple;
        classify(self, other, same)
    }

    fn absorb(&mut self, other: Self) {
        self.private |= other.private;
    }
}

/// Merge the shared collections of two records.
pub fn merge_content(survivor: &mut RecordContent, casualty: RecordContent) {
    survivor.private |= casualty.private;
    merge_list(&mut survivor.notes, casualty.notes);
    merge_list(&mut survivor.attributes, casualty.attributes);
    merge_list(&mut survivor.media, casualty.media);
    merge_list(&mut survivor.events, casualty.events);
}

/// Fold a casualty person's content into the survivor.
///
/// Family lists are left alone; the person merger reconciles those.
pub fn merge_person_content(survivor: &mut Person, casualty: &Person) {
    merge_content(&mut survivor.content, casualty.content.clone());
    survivor
        .alternate_names
        .extend(casualty.alternate_names.iter().cloned());
    merge_list(&mut survivor.ordinances, casualty.ordinances.clone());

    for assoc in &casualty.associations {
        if !survivor.associations.contains(assoc) {
            survivor.associations.push(assoc.clone());
        }
    }
    let (own, gone) = (survivor.handle, casualty.handle);
    survivor
        .associations
        .retain(|a| a.person != own && a.person != gone);
}

#[cfg(test)]
mod tests {
    use super::*;
    use kin_types::{Name, OrdinanceKind, PersonRef};

    fn texts(notes: &[Note]) -> Vec<&str> {
        notes.iter().map(|n| n.text.as_str()).collect()
    }

    #[test]
    fn notes_union_without_duplicates() {
        let mut s = vec![Note::new("A"), Note::new("B")];
        merge_list(&mut s, vec![Note::new("B"), Note::new("C")]);
        assert_eq!(texts(&s), vec!["A", "B", "C"]);
    }

    #[test]
    fn equal_note_absorbs_privacy_and_tags() {
        let mut s = vec![Note::new("A")];
        let mut other = Note::new("A");
        other.private = true;
        other.tags.push("census".into());
        assert_eq!(s[0].equivalence(&other), Equivalence::Equal);

        merge_list(&mut s, vec![other]);
        assert_eq!(s.len(), 1);
        assert!(s[0].private);
        assert_eq!(s[0].tags, vec!["census".to_string()]);
    }

    #[test]
    fn attribute_identity_is_kind_and_value() {
        let a = Attribute::new("Occupation", "Miller");
        let mut b = Attribute::new("Occupation", "Miller");
        b.citations.push("S1".into());
        assert_eq!(a.equivalence(&a.clone()), Equivalence::Identical);
        assert_eq!(a.equivalence(&b), Equivalence::Equal);
        assert_eq!(
            a.equivalence(&Attribute::new("Occupation", "Baker")),
            Equivalence::Different
        );
    }

    #[test]
    fn media_attributes_merge_recursively() {
        let mut m1 = MediaRef::new("photo.jpg");
        m1.attributes.push(Attribute::new("Caption", "Wedding"));
        let mut m2 = MediaRef::new("photo.jpg");
        let mut caption = Attribute::new("Caption", "Wedding");
        caption.citations.push("S9".into());
        m2.attributes.push(caption);
        m2.attributes.push(Attribute::new("Photographer", "Brady"));

        let mut s = vec![m1];
        merge_list(&mut s, vec![m2]);
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].attributes.len(), 2);
        assert_eq!(s[0].attributes[0].citations, vec!["S9".to_string()]);
    }

    #[test]
    fn media_region_distinguishes() {
        let whole = MediaRef::new("photo.jpg");
        let mut crop = MediaRef::new("photo.jpg");
        crop.region = Some([0, 0, 50, 50]);
        assert_eq!(whole.equivalence(&crop), Equivalence::Different);
    }

    #[test]
    fn event_description_prefers_survivor() {
        let mut s = Event::new("Birth").with_date("1850");
        s.description = "at home".into();
        let mut c = Event::new("Birth").with_date("1850");
        c.description = "in hospital".into();
        c.citations.push("S2".into());

        let mut list = vec![s];
        merge_list(&mut list, vec![c]);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].description, "at home");
        assert_eq!(list[0].citations, vec!["S2".to_string()]);
    }

    #[test]
    fn event_description_filled_when_empty() {
        let mut list = vec![Event::new("Death")];
        let mut c = Event::new("Death");
        c.description = "fever".into();
        merge_list(&mut list, vec![c]);
        assert_eq!(list[0].description, "fever");
    }

    #[test]
    fn events_with_different_places_both_kept() {
        let mut list = vec![Event::new("Census").with_place("York")];
        merge_list(&mut list, vec![Event::new("Census").with_place("Leeds")]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn content_privacy_is_or() {
        let mut s = RecordContent::default();
        let c = RecordContent {
            private: true,
            ..Default::default()
        };
        merge_content(&mut s, c);
        assert!(s.private);
    }

    #[test]
    fn person_content_keeps_survivor_scalars() {
        let mut s = Person::new("I1", Name::new("John", "Smith"));
        let mut c = Person::new("I2", Name::new("Johann", "Schmidt"));
        c.alternate_names.push(Name::new("Jack", "Smith"));
        c.ordinances.push(Ordinance::new(OrdinanceKind::Baptism));
        s.ordinances.push(Ordinance::new(OrdinanceKind::Baptism));

        merge_person_content(&mut s, &c);
        assert_eq!(s.primary_name, Name::new("John", "Smith"));
        assert_eq!(s.id, "I1");
        assert_eq!(s.alternate_names, vec![Name::new("Jack", "Smith")]);
        assert_eq!(s.ordinances.len(), 1);
    }

    #[test]
    fn ordinance_privacy_is_absorbed() {
        let mut s = Person::new("I1", Name::default());
        let mut c = Person::new("I2", Name::default());
        s.ordinances.push(Ordinance::new(OrdinanceKind::Baptism));
        let mut private = Ordinance::new(OrdinanceKind::Baptism);
        private.private = true;
        c.ordinances.push(private);
        c.ordinances.push(Ordinance::new(OrdinanceKind::Endowment));

        merge_person_content(&mut s, &c);
        assert_eq!(s.ordinances.len(), 2);
        assert!(s.ordinances[0].private);
        assert_eq!(s.ordinances[1].kind, OrdinanceKind::Endowment);
    }

    #[test]
    fn person_content_drops_self_associations() {
        let mut s = Person::new("I1", Name::default());
        let mut c = Person::new("I2", Name::default());
        let friend = kin_types::Handle::new();
        s.associations.push(PersonRef::new(c.handle, "Cousin"));
        c.associations.push(PersonRef::new(s.handle, "Cousin"));
        c.associations.push(PersonRef::new(friend, "Godfather"));

        merge_person_content(&mut s, &c);
        assert_eq!(s.associations, vec![PersonRef::new(friend, "Godfather")]);
    }
}
