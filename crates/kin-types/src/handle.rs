use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TypeError;

/// Opaque identifier for one stored entity.
///
/// Handles are UUID v7 values: globally unique and time-ordered. A datastore
/// never hands out a handle twice, and a handle whose record was deleted is
/// retired for good. The nil UUID serves as the "null handle" and never
/// names a stored record.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(Uuid);

// No `Default`: a defaulted handle would be a random one.
#[allow(clippy::new_without_default)]
impl Handle {
    /// Generate a fresh handle.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// The null handle.
    pub fn null() -> Self {
        Self(Uuid::nil())
    }

    /// Returns `true` for the null handle.
    pub fn is_null(&self) -> bool {
        self.0.is_nil()
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Short identifier (first 8 hex characters), for log lines.
    pub fn short_id(&self) -> String {
        format!("h:{}", hex::encode(&self.0.as_bytes()[..4]))
    }

    /// Parse from the hyphenated or simple UUID form.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| TypeError::InvalidHandle(format!("{s}: {e}")))
    }
}

impl FromStr for Handle {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.short_id())
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_handles_are_unique() {
        let a = Handle::new();
        let b = Handle::new();
        assert_ne!(a, b);
        assert!(!a.is_null());
    }

    #[test]
    fn null_handle() {
        assert!(Handle::null().is_null());
        assert_eq!(Handle::null(), Handle::from_uuid(Uuid::nil()));
    }

    #[test]
    fn parse_roundtrip() {
        let h = Handle::new();
        let parsed: Handle = h.to_string().parse().unwrap();
        assert_eq!(h, parsed);
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = Handle::parse("not-a-handle").unwrap_err();
        assert!(matches!(err, TypeError::InvalidHandle(_)));
    }

    #[test]
    fn short_id_format() {
        let short = Handle::null().short_id();
        assert_eq!(short, "h:00000000");
    }

    #[test]
    fn serde_is_transparent() {
        let h = Handle::new();
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, format!("\"{h}\""));
        let back: Handle = serde_json::from_str(&json).unwrap();
        assert_eq!(h, back);
    }
}
