use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for annotation ids.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// An interned annotation identifier.
/// Internally a 4-byte `Spur` index, so comparisons and hashing are O(1).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnnotationId(Spur);

impl AnnotationId {
    /// Intern a string as an id, or return the existing handle.
    pub fn intern(s: &str) -> Self {
        AnnotationId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Fresh id backed by a random UUID, unique across sessions.
    pub fn generate() -> Self {
        Self::intern(&uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Debug for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for AnnotationId {
    fn from(s: &str) -> Self {
        Self::intern(s)
    }
}

impl Serialize for AnnotationId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AnnotationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(AnnotationId::intern(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = AnnotationId::intern("note-1");
        let b = AnnotationId::intern("note-1");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "note-1");
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = AnnotationId::generate();
        let b = AnnotationId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = AnnotationId::intern("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
        let back: AnnotationId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(back, id);
    }
}
