//! Provider messages
//!
//! Field requests name a resource by type and ID and ask for one field.
//! An empty `resource_id` together with an empty `field` asks the provider to
//! construct the resource from `args` and answer with a reference to it.
//!
//! Store requests push fully computed resources into a provider, for example
//! resources that a parent provider already knows about.

use factgraph_core::{Error, RawData};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Request for one field of one resource
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataReq {
    /// Connection whose runtime answers the request
    pub connection: u32,
    /// Resource type name
    pub resource: String,
    /// Resource ID; empty to construct from `args`
    #[serde(default)]
    pub resource_id: String,
    /// Field name; empty to construct from `args`
    #[serde(default)]
    pub field: String,
    /// Construction arguments
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub args: BTreeMap<String, RawData>,
}

impl DataReq {
    /// Request `field` of the resource `(resource, resource_id)`
    pub fn field(
        connection: u32,
        resource: impl Into<String>,
        resource_id: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        DataReq {
            connection,
            resource: resource.into(),
            resource_id: resource_id.into(),
            field: field.into(),
            args: BTreeMap::new(),
        }
    }

    /// Request construction of `resource` from `args`
    pub fn construct(
        connection: u32,
        resource: impl Into<String>,
        args: BTreeMap<String, RawData>,
    ) -> Self {
        DataReq {
            connection,
            resource: resource.into(),
            args,
            ..Default::default()
        }
    }

    /// Whether this request asks for construction rather than a field
    pub fn is_construct(&self) -> bool {
        self.resource_id.is_empty() && self.field.is_empty()
    }
}

/// Failure of a field request as seen by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFault {
    /// Resource type name
    pub resource: String,
    /// Field name (empty for construction failures)
    pub field: String,
    /// Human-readable message
    pub message: String,
}

impl FieldFault {
    /// Build a fault for `resource.field` from an error
    pub fn new(resource: impl Into<String>, field: impl Into<String>, error: &Error) -> Self {
        FieldFault {
            resource: resource.into(),
            field: field.into(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for FieldFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}: {}", self.resource, self.message)
        } else {
            write!(f, "{}.{}: {}", self.resource, self.field, self.message)
        }
    }
}

/// Answer to a field request
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataRes {
    /// Field value, absent on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<RawData>,
    /// Failure, absent on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<FieldFault>,
}

impl DataRes {
    /// Successful answer
    pub fn data(data: RawData) -> Self {
        DataRes {
            data: Some(data),
            error: None,
        }
    }

    /// Failed answer
    pub fn fault(fault: FieldFault) -> Self {
        DataRes {
            data: None,
            error: Some(fault),
        }
    }

    /// Whether the request failed
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Take the data, or the fault on failure
    pub fn into_result(self) -> Result<RawData, FieldFault> {
        match (self.error, self.data) {
            (Some(fault), _) => Err(fault),
            (None, Some(data)) => Ok(data),
            (None, None) => Err(FieldFault {
                resource: String::new(),
                field: String::new(),
                message: "response carries neither data nor error".to_string(),
            }),
        }
    }
}

/// Fields of one resource pushed by a store request
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceData {
    /// Resource type name
    pub name: String,
    /// Resource ID
    pub id: String,
    /// Field values to set
    #[serde(default)]
    pub fields: BTreeMap<String, RawData>,
}

/// Batch of resources to store into a connection's runtime
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StoreReq {
    /// Target connection
    pub connection: u32,
    /// Resources to create or update
    pub resources: Vec<ResourceData>,
}

/// Request to register a connection
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectReq {
    /// Requested connection ID; 0 lets the provider allocate one
    #[serde(default)]
    pub id: u32,
    /// Parent connection whose resources are shared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<u32>,
    /// Display name of the target
    #[serde(default)]
    pub name: String,
}

/// Answer to a connect request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectRes {
    /// Connection ID the runtime is registered under
    pub id: u32,
    /// Display name of the target
    pub name: String,
}
