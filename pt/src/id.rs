//! Work-unit identifiers
//!
//! Identifiers arrive from callers (and from the wire) as either strings or
//! integers. They are kept as a closed enum so that de-duplication compares
//! by variant and value: `Int(5)` and `Str("5")` are different ids.

use serde_json::Value;
use std::fmt;

/// Identifier of a single work unit
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemId {
    Int(i64),
    Str(String),
}

impl ItemId {
    /// Decode an identifier that was used as a map key
    ///
    /// JSON object keys are always strings, so a key that is a canonical
    /// integer literal (`"42"`, `"-7"`, not `"007"` or `"+1"`) decodes to
    /// `Int`. Everything else decodes to `Str`.
    pub fn from_key(key: &str) -> Self {
        match key.parse::<i64>() {
            Ok(n) if n.to_string() == key => Self::Int(n),
            _ => Self::Str(key.to_string()),
        }
    }

    /// Decode a map key, preferring a string id already present in `known`
    ///
    /// `"42"` decodes to `Str("42")` when `known` holds that string id and
    /// falls back to [`Self::from_key`] otherwise.
    pub fn from_key_among(key: &str, known: &[ItemId]) -> Self {
        if known.iter().any(|id| id.as_str_id() == Some(key)) {
            return Self::Str(key.to_string());
        }
        Self::from_key(key)
    }

    fn as_str_id(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Int(_) => None,
        }
    }

    /// Convert a structured value into an id, if it is a string or an integer
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Str(s.clone())),
            Value::Number(n) => n.as_i64().map(Self::Int),
            _ => None,
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{}", n),
            Self::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for ItemId {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for ItemId {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<u32> for ItemId {
    fn from(n: u32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<&String> for ItemId {
    fn from(s: &String) -> Self {
        Self::Str(s.clone())
    }
}

impl serde::Serialize for ItemId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Int(n) => serializer.serialize_i64(*n),
            Self::Str(s) => serializer.serialize_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variants_are_distinct() {
        assert_ne!(ItemId::from(5), ItemId::from("5"));
        assert_eq!(ItemId::from(5), ItemId::Int(5));
        assert_eq!(ItemId::from("abc"), ItemId::Str("abc".to_string()));
    }

    #[test]
    fn test_from_key_canonical_integers() {
        assert_eq!(ItemId::from_key("42"), ItemId::Int(42));
        assert_eq!(ItemId::from_key("-7"), ItemId::Int(-7));
        assert_eq!(ItemId::from_key("007"), ItemId::Str("007".to_string()));
        assert_eq!(ItemId::from_key("+1"), ItemId::Str("+1".to_string()));
        assert_eq!(ItemId::from_key("bad1"), ItemId::Str("bad1".to_string()));
    }

    #[test]
    fn test_from_key_among_prefers_known_string_id() {
        let known = vec![ItemId::from("42"), ItemId::from(7)];
        assert_eq!(ItemId::from_key_among("42", &known), ItemId::from("42"));
        assert_eq!(ItemId::from_key_among("7", &known), ItemId::Int(7));
        assert_eq!(ItemId::from_key_among("9", &known), ItemId::Int(9));
        assert_eq!(ItemId::from_key_among("x", &[]), ItemId::from("x"));
    }

    #[test]
    fn test_from_value_rejects_non_ids() {
        assert_eq!(ItemId::from_value(&serde_json::json!(3)), Some(ItemId::Int(3)));
        assert_eq!(ItemId::from_value(&serde_json::json!("x")), Some(ItemId::from("x")));
        assert_eq!(ItemId::from_value(&serde_json::json!(1.5)), None);
        assert_eq!(ItemId::from_value(&serde_json::json!(null)), None);
        assert_eq!(ItemId::from_value(&serde_json::json!([1])), None);
    }

    #[test]
    fn test_serialize_keeps_variant() {
        let ids = vec![ItemId::from(5), ItemId::from("thing1")];
        let json = serde_json::to_string(&ids).unwrap();
        assert_eq!(json, r#"[5,"thing1"]"#);
    }

    #[test]
    fn test_display() {
        assert_eq!(ItemId::from(12).to_string(), "12");
        assert_eq!(ItemId::from("item").to_string(), "item");
    }
}
