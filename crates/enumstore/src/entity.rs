#![forbid(unsafe_code)]

//! Enumeration member records.
//!
//! An [`Entity`] is one id/value pair of reference data, plus an open
//! attribute map so payloads fetched as JSON deserialize without a schema
//! change on the producer side. Identity for invariant checking is the
//! (id, value) pair — see [`Entity::matches`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier of an enumeration member: numeric or textual.
///
/// Serializes untagged, so `1` and `"active"` both round-trip as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumId {
    /// Numeric identifier.
    Num(i64),
    /// Textual identifier.
    Text(String),
}

impl fmt::Display for EnumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for EnumId {
    fn from(id: i64) -> Self {
        Self::Num(id)
    }
}

impl From<i32> for EnumId {
    fn from(id: i32) -> Self {
        Self::Num(i64::from(id))
    }
}

impl From<&str> for EnumId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

impl From<String> for EnumId {
    fn from(id: String) -> Self {
        Self::Text(id)
    }
}

/// One enumeration member: an identifier, a display value, and arbitrary
/// extra attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Member identifier.
    pub id: EnumId,
    /// Display value.
    pub value: String,
    /// Open attribute record; flattened on the wire.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entity {
    /// Create an entity with no extra attributes.
    #[must_use]
    pub fn new(id: impl Into<EnumId>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
            extra: Map::new(),
        }
    }

    /// Attach one extra attribute.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Whether `other` is the same member for invariant checking: identifier
    /// and value both match. Extra attributes are ignored.
    #[must_use]
    pub fn matches(&self, other: &Entity) -> bool {
        self.id == other.id && self.value == other.value
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn matches_ignores_extras() {
        let plain = Entity::new(1, "A");
        let decorated = Entity::new(1, "A").with_extra("color", json!("red"));
        assert!(plain.matches(&decorated));
        assert!(decorated.matches(&plain));
    }

    #[test]
    fn matches_requires_both_id_and_value() {
        let base = Entity::new(1, "A");
        assert!(!base.matches(&Entity::new(1, "B")));
        assert!(!base.matches(&Entity::new(2, "A")));
    }

    #[test]
    fn numeric_and_text_ids_are_distinct() {
        assert_ne!(EnumId::from(1), EnumId::from("1"));
    }

    #[test]
    fn id_display() {
        assert_eq!(EnumId::from(42).to_string(), "42");
        assert_eq!(EnumId::from("pending").to_string(), "pending");
    }

    #[test]
    fn deserializes_remote_payload_shape() {
        let payload = r#"[
            {"id": 1, "value": "Draft"},
            {"id": "final", "value": "Final", "weight": 3}
        ]"#;
        let entities: Vec<Entity> = serde_json::from_str(payload).unwrap();
        assert_eq!(entities[0], Entity::new(1, "Draft"));
        assert_eq!(entities[1].id, EnumId::from("final"));
        assert_eq!(entities[1].extra["weight"], json!(3));
    }

    #[test]
    fn serde_round_trip_with_extras() {
        let entity = Entity::new("cn", "China").with_extra("region", json!("APAC"));
        let text = serde_json::to_string(&entity).unwrap();
        let back: Entity = serde_json::from_str(&text).unwrap();
        assert_eq!(entity, back);
    }

    #[test]
    fn plain_entity_serializes_without_extra_keys() {
        let text = serde_json::to_string(&Entity::new(7, "Seven")).unwrap();
        assert_eq!(text, r#"{"id":7,"value":"Seven"}"#);
    }
}
