//! Runtime values carried by examples, annotations and enums.
//!
//! - A `Value` is always *present*; absence is `Option<Value>` at the use
//!   site, which is what the validator treats as "empty".
//! - `is_zero` is the kind's default (`""`, `0`, `[]`, `{}`, ...), which
//!   matters for required-property checks.
//! - Binary content (from `!include` on `file` types) serializes as base64.
use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
    Binary(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
    Binary,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
            ValueKind::Binary => "binary",
        };
        f.write_str(name)
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Integer(_) => ValueKind::Integer,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
            Value::Binary(_) => ValueKind::Binary,
        }
    }

    /// True when the value equals the default of its own kind.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Boolean(b) => !*b,
            Value::Integer(i) => *i == 0,
            Value::Number(n) => *n == 0.0,
            Value::String(s) => s.is_empty(),
            Value::Array(xs) => xs.is_empty(),
            Value::Object(map) => map.is_empty(),
            Value::Binary(bytes) => bytes.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Build a value from a decoded YAML node. Tags are dropped (the tagged
    /// content is kept); non-string mapping keys are stringified.
    pub fn from_yaml(node: &serde_yaml::Value) -> Result<Value> {
        use serde_yaml::Value as Y;
        Ok(match node {
            Y::Null => Value::Null,
            Y::Bool(b) => Value::Boolean(*b),
            Y::Number(n) => number_from_yaml(n),
            Y::String(s) => Value::String(s.clone()),
            Y::Sequence(xs) => Value::Array(xs.iter().map(Value::from_yaml).collect::<Result<_>>()?),
            Y::Mapping(map) => {
                let mut out = IndexMap::with_capacity(map.len());
                for (key, value) in map {
                    out.insert(yaml_key_string(key)?, Value::from_yaml(value)?);
                }
                Value::Object(out)
            }
            Y::Tagged(tagged) => Value::from_yaml(&tagged.value)?,
        })
    }

    pub fn from_json(json: &serde_json::Value) -> Value {
        use serde_json::Value as J;
        match json {
            J::Null => Value::Null,
            J::Bool(b) => Value::Boolean(*b),
            J::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Number(n.as_f64().unwrap_or_default()),
            },
            J::String(s) => Value::String(s.clone()),
            J::Array(xs) => Value::Array(xs.iter().map(Value::from_json).collect()),
            J::Object(map) => Value::Object(
                map.iter().map(|(k, v)| (k.clone(), Value::from_json(v))).collect(),
            ),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as J;
        match self {
            Value::Null => J::Null,
            Value::Boolean(b) => J::Bool(*b),
            Value::Integer(i) => J::from(*i),
            Value::Number(n) => serde_json::Number::from_f64(*n).map(J::Number).unwrap_or(J::Null),
            Value::String(s) => J::String(s.clone()),
            Value::Array(xs) => J::Array(xs.iter().map(Value::to_json).collect()),
            Value::Object(map) => {
                J::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
            }
            Value::Binary(bytes) => J::String(BASE64.encode(bytes)),
        }
    }

    /// Decode a base64 string back into binary content (used when a cached
    /// document is loaded).
    pub fn decode_binary(&self) -> Option<Value> {
        let text = self.as_str()?;
        BASE64.decode(text).ok().map(Value::Binary)
    }
}

fn number_from_yaml(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        return Value::Integer(i);
    }
    Value::Number(n.as_f64().unwrap_or_default())
}

pub(crate) fn yaml_key_string(key: &serde_yaml::Value) -> Result<String> {
    use serde_yaml::Value as Y;
    match key {
        Y::String(s) => Ok(s.clone()),
        Y::Bool(b) => Ok(b.to_string()),
        Y::Number(n) => Ok(n.to_string()),
        Y::Null => Ok(String::new()),
        Y::Tagged(tagged) => yaml_key_string(&tagged.value),
        Y::Sequence(_) | Y::Mapping(_) => {
            Err(Error::decode("<key>", "mapping keys must be scalars"))
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Value::from_json(&value)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn yaml(src: &str) -> serde_yaml::Value {
        serde_yaml::from_str(src).expect("valid yaml")
    }

    #[test]
    fn yaml_scalars_map_to_their_kinds() {
        let value = Value::from_yaml(&yaml("{a: 1, b: 1.5, c: true, d: text, e: ~, f: [1]}")).unwrap();
        let Value::Object(map) = value else { panic!("expected object") };
        assert_eq!(map["a"].kind(), ValueKind::Integer);
        assert_eq!(map["b"].kind(), ValueKind::Number);
        assert_eq!(map["c"].kind(), ValueKind::Boolean);
        assert_eq!(map["d"].kind(), ValueKind::String);
        assert_eq!(map["e"].kind(), ValueKind::Null);
        assert_eq!(map["f"].kind(), ValueKind::Array);
    }

    #[test]
    fn numeric_mapping_keys_become_strings() {
        let value = Value::from_yaml(&yaml("{200: ok}")).unwrap();
        let Value::Object(map) = value else { panic!("expected object") };
        assert_eq!(map.keys().next().map(String::as_str), Some("200"));
    }

    #[test]
    fn zero_is_the_default_of_each_kind() {
        assert!(Value::Null.is_zero());
        assert!(Value::String(String::new()).is_zero());
        assert!(Value::Array(vec![]).is_zero());
        assert!(Value::Object(IndexMap::new()).is_zero());
        assert!(Value::Number(0.0).is_zero());
        assert!(!Value::from("x").is_zero());
        assert!(!Value::Array(vec![Value::Null]).is_zero(), "non-empty container is not zero");
    }

    #[test]
    fn binary_serializes_as_base64_and_decodes_back() {
        let bin = Value::Binary(vec![0, 1, 2, 255]);
        let json = serde_json::to_value(&bin).unwrap();
        assert_eq!(json, json!("AAEC/w=="));
        let restored = Value::from(json).decode_binary();
        assert_eq!(restored, Some(bin));
    }

    #[test]
    fn json_integers_stay_integers() {
        let value = Value::from(json!({"n": 3, "f": 3.5}));
        let Value::Object(map) = value else { panic!("expected object") };
        assert_eq!(map["n"], Value::Integer(3));
        assert_eq!(map["f"], Value::Number(3.5));
    }
}
