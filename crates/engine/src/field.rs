//! Typed field definitions
//!
//! A [`FieldDef`] ties a field name and [`Type`] to the slot that backs it and
//! to the typed getter that computes it. The provider turns these definitions
//! into its string-keyed dispatch table; in-process callers use the typed
//! getters directly.

use crate::resource::{Resource, ResourceSchema};
use crate::runtime::Runtime;
use crate::slot::{Slot, SlotState, TValue};
use chrono::{DateTime, Duration, Utc};
use factgraph_core::{Error, RawData, ResourceRef, Result, Type, Value};
use std::collections::BTreeMap;

/// Rust types that can live in a field slot
pub trait FieldValue: Clone + Send + Sync + 'static {
    /// Convert into a graph value
    fn into_value(self) -> Value;

    /// Convert from a graph value; `None` if the kind does not match
    fn from_value(value: Value) -> Option<Self>;
}

macro_rules! scalar_field_value {
    ($ty:ty, $variant:ident) => {
        impl FieldValue for $ty {
            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

scalar_field_value!(bool, Bool);
scalar_field_value!(i64, Int);
scalar_field_value!(f64, Float);
scalar_field_value!(String, String);
scalar_field_value!(DateTime<Utc>, Time);
scalar_field_value!(Duration, Duration);
scalar_field_value!(Vec<u8>, Bytes);
scalar_field_value!(Vec<Value>, Array);
scalar_field_value!(BTreeMap<String, Value>, Map);
scalar_field_value!(ResourceRef, Resource);

impl FieldValue for Value {
    fn into_value(self) -> Value {
        self
    }

    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}

impl FieldValue for Vec<String> {
    fn into_value(self) -> Value {
        Value::Array(self.into_iter().map(Value::String).collect())
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }
}

impl FieldValue for Vec<ResourceRef> {
    fn into_value(self) -> Value {
        Value::Array(self.into_iter().map(Value::Resource).collect())
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(|v| match v {
                    Value::Resource(r) => Some(r),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }
}

impl FieldValue for BTreeMap<String, String> {
    fn into_value(self) -> Value {
        Value::Map(
            self.into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect(),
        )
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| match v {
                    Value::String(s) => Some((k, s)),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }
}

/// Convert a slot snapshot into RawData of type `ty`
pub fn to_raw<T: FieldValue>(ty: &Type, value: TValue<T>) -> RawData {
    if let Some(error) = value.error {
        return RawData::error(ty.clone(), error);
    }
    match (value.state, value.data) {
        (SlotState::Set, Some(data)) => {
            let value = data.into_value();
            debug_assert!(ty.accepts(&value), "{} does not accept {}", ty, value.kind());
            RawData::new(ty.clone(), value)
        }
        _ => RawData::null(ty.clone()),
    }
}

/// Convert RawData into a slot state, checking it against `ty`
pub fn from_raw<T: FieldValue>(
    resource: &str,
    field: &str,
    ty: &Type,
    raw: RawData,
) -> Result<TValue<T>> {
    if let Some(error) = raw.error {
        return Ok(TValue::failed(error));
    }
    if raw.value.is_null() {
        return Ok(TValue::null());
    }
    let actual = raw.value.kind();
    if ty.accepts(&raw.value) {
        if let Some(data) = T::from_value(raw.value) {
            return Ok(TValue::value(data));
        }
    }
    Err(Error::TypeMismatch {
        resource: resource.to_string(),
        field: field.to_string(),
        expected: ty.to_string(),
        actual: actual.to_string(),
    })
}

type Getter<R> = Box<dyn Fn(&R, &Runtime) -> RawData + Send + Sync>;
type Setter<R> = Box<dyn Fn(&R, RawData) -> Result<()> + Send + Sync>;

/// One exposed field of resource type `R`
pub struct FieldDef<R> {
    pub(crate) name: &'static str,
    pub(crate) ty: Type,
    pub(crate) get: Getter<R>,
    pub(crate) set: Setter<R>,
}

impl<R: ResourceSchema> FieldDef<R> {
    /// Computed field: `get` is the typed getter, usually a method that calls
    /// [`Runtime::field`]
    pub fn new<T: FieldValue>(
        name: &'static str,
        ty: Type,
        slot: fn(&R) -> &Slot<T>,
        get: fn(&R, &Runtime) -> TValue<T>,
    ) -> Self {
        let get_ty = ty.clone();
        let set_ty = ty.clone();
        FieldDef {
            name,
            ty,
            get: Box::new(move |res, rt| to_raw(&get_ty, get(res, rt))),
            set: Box::new(move |res, raw| {
                let value = from_raw(res.type_name(), name, &set_ty, raw)?;
                slot(res).set(value);
                Ok(())
            }),
        }
    }

    /// Argument-backed field: set at construction, null if never supplied.
    ///
    /// Reads still go through the recording first.
    pub fn stored<T: FieldValue>(name: &'static str, ty: Type, slot: fn(&R) -> &Slot<T>) -> Self {
        let get_ty = ty.clone();
        let set_ty = ty.clone();
        FieldDef {
            name,
            ty,
            get: Box::new(move |res, rt| {
                to_raw(&get_ty, rt.field(res, name, slot(res), || Ok(None)))
            }),
            set: Box::new(move |res, raw| {
                let value = from_raw(res.type_name(), name, &set_ty, raw)?;
                slot(res).set(value);
                Ok(())
            }),
        }
    }

    /// Field name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Field type
    pub fn ty(&self) -> &Type {
        &self.ty
    }
}
