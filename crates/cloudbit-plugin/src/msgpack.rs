//! msgpack codec for `DynamicValue` payloads
//!
//! Terraform encodes values with cty's msgpack scheme: objects and maps are
//! msgpack maps keyed by attribute name, lists and sets are arrays, and an
//! unknown value is an extension value (type 0, or type 12 for refined
//! unknowns).

use crate::error::{PluginError, Result};
use crate::value::Value;
use std::collections::BTreeMap;

const UNKNOWN_EXT: i8 = 0;
const REFINED_UNKNOWN_EXT: i8 = 12;

/// Decode a msgpack payload. An empty payload decodes to null.
pub fn decode(bytes: &[u8]) -> Result<Value> {
    if bytes.is_empty() {
        return Ok(Value::Null);
    }

    let mut reader = bytes;
    let raw = rmpv::decode::read_value(&mut reader)
        .map_err(|e| PluginError::Msgpack(e.to_string()))?;
    from_rmpv(raw)
}

/// Encode a value as msgpack
pub fn encode(value: &Value) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    rmpv::encode::write_value(&mut buf, &to_rmpv(value))
        .map_err(|e| PluginError::Msgpack(e.to_string()))?;
    Ok(buf)
}

fn from_rmpv(raw: rmpv::Value) -> Result<Value> {
    Ok(match raw {
        rmpv::Value::Nil => Value::Null,
        rmpv::Value::Boolean(b) => Value::Bool(b),
        rmpv::Value::Integer(n) => Value::Number(
            n.as_i64()
                .map(|n| n as f64)
                .or_else(|| n.as_u64().map(|n| n as f64))
                .or_else(|| n.as_f64())
                .unwrap_or_default(),
        ),
        rmpv::Value::F32(n) => Value::Number(f64::from(n)),
        rmpv::Value::F64(n) => Value::Number(n),
        rmpv::Value::String(s) => {
            let s = s
                .into_str()
                .ok_or_else(|| PluginError::InvalidValue("string is not valid UTF-8".into()))?;
            Value::String(s)
        }
        rmpv::Value::Binary(_) => {
            return Err(PluginError::InvalidValue(
                "binary values are not supported".into(),
            ));
        }
        rmpv::Value::Array(items) => {
            Value::List(items.into_iter().map(from_rmpv).collect::<Result<_>>()?)
        }
        rmpv::Value::Map(entries) => {
            let mut attrs = BTreeMap::new();
            for (key, value) in entries {
                let key = match key {
                    rmpv::Value::String(s) => s.into_str().ok_or_else(|| {
                        PluginError::InvalidValue("attribute name is not valid UTF-8".into())
                    })?,
                    other => {
                        return Err(PluginError::InvalidValue(format!(
                            "attribute name must be a string, got {}",
                            other
                        )));
                    }
                };
                attrs.insert(key, from_rmpv(value)?);
            }
            Value::Object(attrs)
        }
        rmpv::Value::Ext(UNKNOWN_EXT | REFINED_UNKNOWN_EXT, _) => Value::Unknown,
        rmpv::Value::Ext(kind, _) => {
            return Err(PluginError::InvalidValue(format!(
                "unsupported msgpack extension type {}",
                kind
            )));
        }
    })
}

fn to_rmpv(value: &Value) -> rmpv::Value {
    match value {
        Value::Null => rmpv::Value::Nil,
        Value::Unknown => rmpv::Value::Ext(UNKNOWN_EXT, vec![0]),
        Value::Bool(b) => rmpv::Value::Boolean(*b),
        Value::Number(n) if n.fract() == 0.0 && n.abs() < (i64::MAX as f64) => {
            rmpv::Value::from(*n as i64)
        }
        Value::Number(n) => rmpv::Value::F64(*n),
        Value::String(s) => rmpv::Value::String(s.as_str().into()),
        Value::List(items) | Value::Set(items) => {
            rmpv::Value::Array(items.iter().map(to_rmpv).collect())
        }
        Value::Map(entries) | Value::Object(entries) => rmpv::Value::Map(
            entries
                .iter()
                .map(|(k, v)| (rmpv::Value::String(k.as_str().into()), to_rmpv(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_payload_is_null() {
        assert_eq!(decode(&[]).unwrap(), Value::Null);
    }

    #[test]
    fn test_unknown_uses_extension_zero() {
        let bytes = encode(&Value::Unknown).unwrap();
        assert_eq!(bytes, vec![0xd4, 0x00, 0x00]);
        assert_eq!(decode(&bytes).unwrap(), Value::Unknown);
    }

    #[test]
    fn test_refined_unknown_decodes_as_unknown() {
        // fixext1, type 12
        assert_eq!(decode(&[0xd4, 0x0c, 0x00]).unwrap(), Value::Unknown);
    }

    #[test]
    fn test_nested_object() {
        let value = Value::object([
            ("id", Value::from(17)),
            ("name", Value::from("web-01")),
            ("public_ip", Value::Null),
            ("price", Value::from(12.5)),
            (
                "attachment",
                Value::object([("id", Value::Unknown), ("type", Value::from("server"))]),
            ),
            ("tags", Value::List(vec![Value::from("a"), Value::from("b")])),
        ]);

        let decoded = decode(&encode(&value).unwrap()).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_rejects_non_string_keys() {
        let raw = rmpv::Value::Map(vec![(rmpv::Value::from(1), rmpv::Value::Nil)]);
        let mut buf = Vec::new();
        rmpv::encode::write_value(&mut buf, &raw).unwrap();
        assert!(decode(&buf).is_err());
    }
}
