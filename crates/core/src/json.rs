//! JSON encoding for RawData
//!
//! RawData is stored in recordings and carried on the wire as a JSON object:
//!
//! ```json
//! {"type": "[]string", "value": ["a", "b"]}
//! {"type": "string", "error": {"Compute": {"resource": "file", "field": "content", "message": "..."}}}
//! ```
//!
//! The `value` is encoded according to the declared type:
//!
//! | Type | JSON |
//! |------|------|
//! | time | RFC 3339 string (unix seconds accepted when decoding) |
//! | duration | integer milliseconds |
//! | bytes | base64 string |
//! | resource | `{"Name": type, "ID": id}` |
//! | dict / any | plain JSON |
//!
//! A null value is omitted. Errors are serialized with their full structure so
//! a replayed error is indistinguishable from the original.

use crate::error::{Error, Result};
use crate::types::Type;
use crate::value::{RawData, ResourceRef, Value};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number};

/// Encode a value as JSON
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::Number((*i).into()),
        Value::Float(f) => Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Time(t) => serde_json::Value::String(t.to_rfc3339()),
        Value::Duration(d) => serde_json::Value::Number(d.num_milliseconds().into()),
        Value::Bytes(b) => serde_json::Value::String(BASE64.encode(b)),
        Value::Array(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
        Value::Map(entries) => serde_json::Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), value_to_json(v)))
                .collect(),
        ),
        Value::Resource(r) => {
            let mut obj = Map::new();
            obj.insert("Name".to_string(), serde_json::Value::String(r.name.clone()));
            obj.insert("ID".to_string(), serde_json::Value::String(r.id.clone()));
            serde_json::Value::Object(obj)
        }
    }
}

/// Decode a JSON value according to its declared type
pub fn value_from_json(ty: &Type, json: serde_json::Value) -> Result<Value> {
    if json.is_null() {
        return Ok(Value::Null);
    }
    match ty {
        Type::Any | Type::Dict => Ok(dict_from_json(json)),
        Type::Null => Err(mismatch(ty, &json)),
        Type::Bool => json.as_bool().map(Value::Bool).ok_or_else(|| mismatch(ty, &json)),
        Type::Int => json_int(&json).map(Value::Int).ok_or_else(|| mismatch(ty, &json)),
        Type::Float => json.as_f64().map(Value::Float).ok_or_else(|| mismatch(ty, &json)),
        Type::String => match json {
            serde_json::Value::String(s) => Ok(Value::String(s)),
            other => Err(mismatch(ty, &other)),
        },
        Type::Time => time_from_json(&json).ok_or_else(|| mismatch(ty, &json)),
        Type::Duration => json_int(&json)
            .map(|ms| Value::Duration(Duration::milliseconds(ms)))
            .ok_or_else(|| mismatch(ty, &json)),
        Type::Bytes => match &json {
            serde_json::Value::String(s) => BASE64
                .decode(s)
                .map(Value::Bytes)
                .map_err(|e| Error::Serialization(format!("invalid base64 bytes: {e}"))),
            _ => Err(mismatch(ty, &json)),
        },
        Type::Array(child) => match json {
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(|item| value_from_json(child, item))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            other => Err(mismatch(ty, &other)),
        },
        Type::Map(child) => match json {
            serde_json::Value::Object(entries) => entries
                .into_iter()
                .map(|(k, v)| value_from_json(child, v).map(|v| (k, v)))
                .collect::<Result<_>>()
                .map(Value::Map),
            other => Err(mismatch(ty, &other)),
        },
        Type::Resource(name) => {
            let r: ResourceRef = serde_json::from_value(json).map_err(|e| {
                Error::Serialization(format!("incorrect reference to '{name}': {e}"))
            })?;
            if &r.name != name {
                return Err(Error::Serialization(format!(
                    "reference to '{}' where '{name}' was expected",
                    r.name
                )));
            }
            Ok(Value::Resource(r))
        }
    }
}

fn mismatch(ty: &Type, json: &serde_json::Value) -> Error {
    Error::Serialization(format!("expected {ty} value, got {json}"))
}

fn json_int(json: &serde_json::Value) -> Option<i64> {
    json.as_i64()
        .or_else(|| json.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
}

fn time_from_json(json: &serde_json::Value) -> Option<Value> {
    match json {
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| Value::Time(t.with_timezone(&Utc))),
        serde_json::Value::Number(_) => json_int(json)
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .map(Value::Time),
        _ => None,
    }
}

fn dict_from_json(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => {
            Value::Array(items.into_iter().map(dict_from_json).collect())
        }
        serde_json::Value::Object(entries) => Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k, dict_from_json(v)))
                .collect(),
        ),
    }
}

fn default_type() -> Type {
    Type::Any
}

#[derive(Serialize, Deserialize)]
struct RawDataRepr {
    #[serde(rename = "type", default = "default_type")]
    ty: Type,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<Error>,
}

impl Serialize for RawData {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let value = match &self.value {
            Value::Null => None,
            v => Some(value_to_json(v)),
        };
        RawDataRepr {
            ty: self.ty.clone(),
            value,
            error: self.error.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RawData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let repr = RawDataRepr::deserialize(deserializer)?;
        let value = match repr.value {
            Some(json) => value_from_json(&repr.ty, json).map_err(serde::de::Error::custom)?,
            None => Value::Null,
        };
        Ok(RawData {
            ty: repr.ty,
            value,
            error: repr.error,
        })
    }
}
