//! Value types for the resource graph
//!
//! This module defines:
//! - Value: closed enum for every kind of data a field can hold
//! - ResourceRef: `(type, id)` stand-in for another resource
//! - RawData: a typed value with an attached error, used at every boundary
//!
//! ## Value Model
//!
//! - Null, Bool, Int, Float, String, Time, Duration, Bytes, Array, Map, Resource
//! - No implicit coercions: `Int(1) != Float(1.0)`, `Bytes` are not `String`
//! - Maps are ordered by key so that equal maps encode identically
//! - Resource references are never pointers; they are resolved against the
//!   registry when they are read
//!
//! ## RawData
//!
//! A `RawData` with an error may still carry a null value. Consumers treat
//! `(value, error)` as one unit and check the error first, see
//! [`RawData::into_result`].

use crate::error::{Error, Result};
use crate::types::Type;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Reference to a resource by type name and ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceRef {
    /// Resource type name (e.g. `certificate`)
    #[serde(rename = "Name")]
    pub name: String,
    /// Resource ID within its type
    #[serde(rename = "ID")]
    pub id: String,
}

impl ResourceRef {
    /// Create a reference
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        ResourceRef {
            name: name.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} id = {}", self.name, self.id)
    }
}

/// Data carried by a field, argument, or recorded value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point (IEEE-754)
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Point in time
    Time(DateTime<Utc>),
    /// Signed duration
    Duration(Duration),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Ordered list of values
    Array(Vec<Value>),
    /// Ordered string-keyed map
    Map(BTreeMap<String, Value>),
    /// Reference to another resource
    Resource(ResourceRef),
}

impl Value {
    /// Get the kind name as a string
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Time(_) => "time",
            Value::Duration(_) => "duration",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Resource(_) => "resource",
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as bool if this is a Bool value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is an Int value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as &str if this is a String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as &[Value] if this is an Array value
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get as map if this is a Map value
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Get the reference if this is a Resource value
    pub fn as_resource(&self) -> Option<&ResourceRef> {
        match self {
            Value::Resource(r) => Some(r),
            _ => None,
        }
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

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<ResourceRef> for Value {
    fn from(r: ResourceRef) -> Self {
        Value::Resource(r)
    }
}

impl From<Vec<Value>> for Value {
    fn from(a: Vec<Value>) -> Self {
        Value::Array(a)
    }
}

/// A typed value with an optional error, exchanged at every boundary
#[derive(Debug, Clone, PartialEq)]
pub struct RawData {
    /// Declared type of the value
    pub ty: Type,
    /// The value; null when absent or when an error is present
    pub value: Value,
    /// Error that replaces the value, if any
    pub error: Option<Error>,
}

impl RawData {
    /// Typed value without error
    pub fn new(ty: Type, value: Value) -> Self {
        RawData {
            ty,
            value,
            error: None,
        }
    }

    /// String value
    pub fn string(s: impl Into<String>) -> Self {
        RawData::new(Type::String, Value::String(s.into()))
    }

    /// Integer value
    pub fn int(i: i64) -> Self {
        RawData::new(Type::Int, Value::Int(i))
    }

    /// Float value
    pub fn float(f: f64) -> Self {
        RawData::new(Type::Float, Value::Float(f))
    }

    /// Boolean value
    pub fn bool(b: bool) -> Self {
        RawData::new(Type::Bool, Value::Bool(b))
    }

    /// Time value
    pub fn time(t: DateTime<Utc>) -> Self {
        RawData::new(Type::Time, Value::Time(t))
    }

    /// Duration value
    pub fn duration(d: Duration) -> Self {
        RawData::new(Type::Duration, Value::Duration(d))
    }

    /// Bytes value
    pub fn bytes(b: impl Into<Vec<u8>>) -> Self {
        RawData::new(Type::Bytes, Value::Bytes(b.into()))
    }

    /// Array whose elements have type `child`
    pub fn array(items: Vec<Value>, child: Type) -> Self {
        RawData::new(Type::array(child), Value::Array(items))
    }

    /// String-keyed map whose values have type `child`
    pub fn map(entries: BTreeMap<String, Value>, child: Type) -> Self {
        RawData::new(Type::map(child), Value::Map(entries))
    }

    /// Free-form nested data
    pub fn dict(value: Value) -> Self {
        RawData::new(Type::Dict, value)
    }

    /// Reference to another resource
    pub fn resource(name: impl Into<String>, id: impl Into<String>) -> Self {
        let r = ResourceRef::new(name, id);
        RawData::new(Type::Resource(r.name.clone()), Value::Resource(r))
    }

    /// Null of the given type
    pub fn null(ty: Type) -> Self {
        RawData::new(ty, Value::Null)
    }

    /// Error in place of a value of the given type
    pub fn error(ty: Type, error: Error) -> Self {
        RawData {
            ty,
            value: Value::Null,
            error: Some(error),
        }
    }

    /// Check if an error is attached
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Check if the value is null and no error is attached
    pub fn is_null(&self) -> bool {
        self.error.is_none() && self.value.is_null()
    }

    /// Borrow the value, or the error if one is attached
    pub fn as_result(&self) -> Result<&Value> {
        match &self.error {
            Some(e) => Err(e.clone()),
            None => Ok(&self.value),
        }
    }

    /// Take the value, or the error if one is attached
    pub fn into_result(self) -> Result<Value> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.value),
        }
    }
}
