//! Type descriptors for field values
//!
//! Every [`RawData`](crate::RawData) carries a [`Type`] next to its value.
//! Types have a stable text label that is used in recordings and on the wire:
//!
//! | Type | Label |
//! |------|-------|
//! | `Any` | `any` |
//! | `Null` | `null` |
//! | `Bool` | `bool` |
//! | `Int` | `int` |
//! | `Float` | `float` |
//! | `String` | `string` |
//! | `Time` | `time` |
//! | `Duration` | `duration` |
//! | `Bytes` | `bytes` |
//! | `Dict` | `dict` |
//! | `Array(T)` | `[]T` |
//! | `Map(T)` | `map[string]T` |
//! | `Resource(name)` | `name` |
//!
//! Any label that is not one of the reserved names is a resource type name.

use crate::error::Error;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const ARRAY_PREFIX: &str = "[]";
const MAP_PREFIX: &str = "map[string]";

/// Type descriptor for a field or argument value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Type {
    /// Any value (no shape check)
    Any,
    /// Only null
    Null,
    /// Boolean
    Bool,
    /// 64-bit signed integer
    Int,
    /// 64-bit float
    Float,
    /// UTF-8 string
    String,
    /// Point in time (UTC)
    Time,
    /// Signed duration
    Duration,
    /// Raw bytes
    Bytes,
    /// Free-form nested data (JSON-like)
    Dict,
    /// Ordered list with a typed element
    Array(Box<Type>),
    /// String-keyed map with a typed value
    Map(Box<Type>),
    /// Reference to a resource of the named type
    Resource(String),
}

impl Type {
    /// Array of `child`
    pub fn array(child: Type) -> Self {
        Type::Array(Box::new(child))
    }

    /// String-keyed map of `child`
    pub fn map(child: Type) -> Self {
        Type::Map(Box::new(child))
    }

    /// Reference to a resource type
    pub fn resource(name: impl Into<String>) -> Self {
        Type::Resource(name.into())
    }

    /// Element type for arrays and maps
    pub fn child(&self) -> Option<&Type> {
        match self {
            Type::Array(child) | Type::Map(child) => Some(child),
            _ => None,
        }
    }

    /// Resource type name if this is a resource reference
    pub fn resource_name(&self) -> Option<&str> {
        match self {
            Type::Resource(name) => Some(name),
            _ => None,
        }
    }

    /// Check whether `value` has the shape this type describes.
    ///
    /// `Null` is accepted by every type: a field may legitimately be absent.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Type::Any, _) | (Type::Dict, _) => true,
            (Type::Bool, Value::Bool(_)) => true,
            (Type::Int, Value::Int(_)) => true,
            (Type::Float, Value::Float(_)) => true,
            (Type::String, Value::String(_)) => true,
            (Type::Time, Value::Time(_)) => true,
            (Type::Duration, Value::Duration(_)) => true,
            (Type::Bytes, Value::Bytes(_)) => true,
            (Type::Array(child), Value::Array(items)) => items.iter().all(|v| child.accepts(v)),
            (Type::Map(child), Value::Map(entries)) => entries.values().all(|v| child.accepts(v)),
            (Type::Resource(name), Value::Resource(r)) => &r.name == name,
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Any => f.write_str("any"),
            Type::Null => f.write_str("null"),
            Type::Bool => f.write_str("bool"),
            Type::Int => f.write_str("int"),
            Type::Float => f.write_str("float"),
            Type::String => f.write_str("string"),
            Type::Time => f.write_str("time"),
            Type::Duration => f.write_str("duration"),
            Type::Bytes => f.write_str("bytes"),
            Type::Dict => f.write_str("dict"),
            Type::Array(child) => write!(f, "{ARRAY_PREFIX}{child}"),
            Type::Map(child) => write!(f, "{MAP_PREFIX}{child}"),
            Type::Resource(name) => f.write_str(name),
        }
    }
}

impl FromStr for Type {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(child) = s.strip_prefix(ARRAY_PREFIX) {
            return Ok(Type::array(child.parse()?));
        }
        if let Some(child) = s.strip_prefix(MAP_PREFIX) {
            return Ok(Type::map(child.parse()?));
        }
        let ty = match s {
            "any" => Type::Any,
            "null" => Type::Null,
            "bool" => Type::Bool,
            "int" => Type::Int,
            "float" => Type::Float,
            "string" => Type::String,
            "time" => Type::Time,
            "duration" => Type::Duration,
            "bytes" => Type::Bytes,
            "dict" => Type::Dict,
            "" => return Err(Error::Serialization("empty type label".to_string())),
            other if other.contains(['[', ']', ' ']) => {
                return Err(Error::Serialization(format!("invalid type label '{other}'")))
            }
            name => Type::Resource(name.to_string()),
        };
        Ok(ty)
    }
}

impl From<Type> for String {
    fn from(ty: Type) -> Self {
        ty.to_string()
    }
}

impl TryFrom<String> for Type {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
