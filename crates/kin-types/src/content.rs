//! Content records carried by persons and families.
//!
//! These are embedded values, not stored entities: they hold no handles and
//! never appear in the backlink index. How two of them combine during a
//! merge is decided by the merge engine.

use serde::{Deserialize, Serialize};

/// A personal name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name {
    pub first_name: String,
    pub surname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub private: bool,
}

impl Name {
    pub fn new(first_name: impl Into<String>, surname: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            surname: surname.into(),
            title: None,
            private: false,
        }
    }

    /// "First Surname", skipping empty parts.
    pub fn display(&self) -> String {
        match (self.first_name.is_empty(), self.surname.is_empty()) {
            (false, false) => format!("{} {}", self.first_name, self.surname),
            (false, true) => self.first_name.clone(),
            (true, false) => self.surname.clone(),
            (true, true) => String::new(),
        }
    }
}

/// A free-text note.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub private: bool,
}

impl Note {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tags: Vec::new(),
            private: false,
        }
    }
}

/// A typed key/value attribute (e.g. "Occupation" = "Miller").
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub kind: String,
    pub value: String,
    #[serde(default)]
    pub citations: Vec<String>,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default)]
    pub private: bool,
}

impl Attribute {
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
            citations: Vec::new(),
            notes: Vec::new(),
            private: false,
        }
    }
}

/// A reference to a media file, optionally restricted to a region.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub path: String,
    /// Region of interest as (x1, y1, x2, y2) percentages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<[u8; 4]>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub citations: Vec<String>,
    #[serde(default)]
    pub private: bool,
}

impl MediaRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            region: None,
            attributes: Vec::new(),
            citations: Vec::new(),
            private: false,
        }
    }
}

/// A dated life event (birth, marriage, census, ...).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub citations: Vec<String>,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default)]
    pub private: bool,
}

impl Event {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_place(mut self, place: impl Into<String>) -> Self {
        self.place = Some(place.into());
        self
    }
}

/// The collection fields shared by persons and families.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordContent {
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub media: Vec<MediaRef>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub private: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_display() {
        assert_eq!(Name::new("Ada", "Byron").display(), "Ada Byron");
        assert_eq!(Name::new("Ada", "").display(), "Ada");
        assert_eq!(Name::new("", "Byron").display(), "Byron");
        assert_eq!(Name::default().display(), "");
    }

    #[test]
    fn event_builder() {
        let e = Event::new("Birth").with_date("1815-12-10").with_place("London");
        assert_eq!(e.kind, "Birth");
        assert_eq!(e.date.as_deref(), Some("1815-12-10"));
        assert_eq!(e.place.as_deref(), Some("London"));
    }

    #[test]
    fn content_deserializes_with_missing_fields() {
        let c: RecordContent = serde_json::from_str(r#"{"notes":[{"text":"hi"}]}"#).unwrap();
        assert_eq!(c.notes, vec![Note::new("hi")]);
        assert!(c.attributes.is_empty());
        assert!(!c.private);
    }
}
