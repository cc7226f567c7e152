//! Terraform values
//!
//! [`Value`] mirrors the subset of the cty type system the provider uses.
//! Values travel over the wire as msgpack (see [`crate::msgpack`]) and are
//! converted to typed Rust models through `serde_json`, where unknown values
//! become `null`.

use crate::error::{PluginError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

static NULL: Value = Value::Null;

/// A Terraform value
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Null of any type
    #[default]
    Null,
    /// Not known until apply
    Unknown,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    /// Element order is not significant
    Set(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Build an object from attribute/value pairs
    pub fn object<I, K>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Object(
            attributes
                .into_iter()
                .map(|(k, v)| (k.into(), v))
                .collect(),
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown)
    }

    /// True when neither this value nor anything nested in it is unknown
    pub fn is_wholly_known(&self) -> bool {
        match self {
            Value::Unknown => false,
            Value::List(items) | Value::Set(items) => items.iter().all(Value::is_wholly_known),
            Value::Map(entries) | Value::Object(entries) => {
                entries.values().all(Value::is_wholly_known)
            }
            _ => true,
        }
    }

    /// Look up an attribute of an object (or a key of a map)
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Object(attrs) | Value::Map(attrs) => attrs.get(name),
            _ => None,
        }
    }

    /// Like [`Value::get`] but treats a missing attribute as null
    pub fn attr(&self, name: &str) -> &Value {
        self.get(name).unwrap_or(&NULL)
    }

    /// Set an attribute on an object value; no-op for other kinds
    pub fn set_attr(&mut self, name: impl Into<String>, value: Value) {
        if let Value::Object(attrs) = self {
            attrs.insert(name.into(), value);
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) if n.fract() == 0.0 => Some(*n as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Elements of a list or set
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Set(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(attrs) => Some(attrs),
            _ => None,
        }
    }

    /// Convert from JSON. Arrays become lists and objects become objects;
    /// schema conformance later refines them into sets or maps.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or_default()),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(attrs) => Value::Object(
                attrs
                    .into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert to JSON. Unknown values become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null | Value::Unknown => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) | Value::Set(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(entries) | Value::Object(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Decode into a typed model
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.to_json())?)
    }

    /// Encode a typed model
    pub fn encode<T: Serialize>(model: &T) -> Result<Self> {
        Ok(Value::from_json(serde_json::to_value(model)?))
    }

    /// Parse a JSON document into a value
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let json: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| PluginError::InvalidValue(format!("invalid JSON state: {}", e)))?;
        Ok(Value::from_json(json))
    }
}

/// Integral numbers are emitted as JSON integers so that they decode into
/// integer model fields.
fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) | (Value::Unknown, Value::Unknown) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => {
                a.len() == b.len() && a.iter().all(|x| b.contains(x)) && b.iter().all(|y| a.contains(y))
            }
            (Value::Map(a), Value::Map(b)) | (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Router {
        id: Option<i64>,
        name: String,
        public: Option<bool>,
    }

    #[test]
    fn test_set_equality_ignores_order() {
        let a = Value::Set(vec![Value::from(1), Value::from(2)]);
        let b = Value::Set(vec![Value::from(2), Value::from(1)]);
        assert_eq!(a, b);

        let la = Value::List(vec![Value::from(1), Value::from(2)]);
        let lb = Value::List(vec![Value::from(2), Value::from(1)]);
        assert_ne!(la, lb);
    }

    #[test]
    fn test_decode_treats_unknown_as_null() {
        let value = Value::object([
            ("id", Value::Unknown),
            ("name", Value::from("edge")),
            ("public", Value::from(true)),
        ]);

        let router: Router = value.decode().unwrap();
        assert_eq!(
            router,
            Router {
                id: None,
                name: "edge".to_string(),
                public: Some(true),
            }
        );
    }

    #[test]
    fn test_encode_integral_numbers() {
        let value = Value::encode(&Router {
            id: Some(42),
            name: "edge".to_string(),
            public: None,
        })
        .unwrap();

        assert_eq!(value.attr("id").as_i64(), Some(42));
        assert!(value.attr("public").is_null());
        assert!(value.attr("missing").is_null());
        assert_eq!(value.to_json()["id"], serde_json::json!(42));
    }

    #[test]
    fn test_wholly_known() {
        let value = Value::object([(
            "nested",
            Value::List(vec![Value::from("a"), Value::Unknown]),
        )]);
        assert!(!value.is_wholly_known());
        assert!(Value::from("a").is_wholly_known());
    }
}
