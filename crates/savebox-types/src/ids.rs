//! Canonical string form for identifiers crossing a serialization boundary.

use serde_json::Value;

use crate::object_id::ObjectId;

/// Every shape an identifier can take before it is written out.
#[derive(Debug, Clone, PartialEq)]
pub enum Identifier {
    Absent,
    Text(String),
    Object(ObjectId),
    Integer(i64),
    Other(Value),
}

/// Normalize an identifier to its string form. Never fails.
pub fn id_to_string(id: &Identifier) -> String {
    match id {
        Identifier::Absent => String::new(),
        Identifier::Text(s) => s.clone(),
        Identifier::Object(oid) => oid.to_hex(),
        Identifier::Integer(n) => n.to_string(),
        Identifier::Other(Value::String(s)) => s.clone(),
        Identifier::Other(Value::Null) => String::new(),
        Identifier::Other(value) => value.to_string(),
    }
}

impl From<ObjectId> for Identifier {
    fn from(oid: ObjectId) -> Self {
        Self::Object(oid)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Identifier {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl<T: Into<Identifier>> From<Option<T>> for Identifier {
    fn from(id: Option<T>) -> Self {
        id.map_or(Self::Absent, Into::into)
    }
}

/// Classifies JSON input. Extended-JSON `{"$oid": "..."}` with a valid hex
/// payload becomes an object id; malformed ones stay `Other`.
impl From<&Value> for Identifier {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Absent,
            Value::String(s) => Self::Text(s.clone()),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Other(value.clone()),
            },
            Value::Object(map) => match map.get("$oid").and_then(Value::as_str) {
                Some(hex) if map.len() == 1 => ObjectId::parse_str(hex)
                    .map(Self::Object)
                    .unwrap_or_else(|_| Self::Other(value.clone())),
                _ => Self::Other(value.clone()),
            },
            _ => Self::Other(value.clone()),
        }
    }
}
