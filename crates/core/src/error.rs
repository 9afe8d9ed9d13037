//! Error types for the resource graph
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Errors are values inside the graph: a failed field computation is frozen
//! into its slot and handed back on every later read. For that reason the
//! error type is `Clone`, comparable, and serializable, so it can be cached,
//! written into recordings, and carried across the transport boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for graph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the resource graph
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum Error {
    /// A resource's ID could not be computed from its arguments
    #[error("cannot compute identity of resource '{resource}': {reason}")]
    Identity {
        /// Resource type name
        resource: String,
        /// Why the identity function failed
        reason: String,
    },

    /// No factory is registered for the requested type name
    #[error("cannot find resource '{resource}' in this provider")]
    UnknownResource {
        /// Requested type name
        resource: String,
    },

    /// A setter received a value of the wrong kind
    #[error("cannot set '{field}' in resource '{resource}', type does not match (expected {expected}, got {actual})")]
    TypeMismatch {
        /// Resource type name
        resource: String,
        /// Field name
        field: String,
        /// Expected type label
        expected: String,
        /// Kind of the value that was supplied
        actual: String,
    },

    /// A resource-specific compute function failed
    #[error("failed to compute '{resource}.{field}': {message}")]
    Compute {
        /// Resource type name
        resource: String,
        /// Field name
        field: String,
        /// Underlying failure
        message: String,
    },

    /// The field has no entry in the dispatch table for this type
    #[error("cannot find '{field}' in resource '{resource}'")]
    Dispatch {
        /// Resource type name
        resource: String,
        /// Field name
        field: String,
    },

    /// The registry holds no resource with this type and ID
    #[error("resource '{resource}' (id: {id}) doesn't exist")]
    ResourceNotFound {
        /// Resource type name
        resource: String,
        /// Resource ID
        id: String,
    },

    /// An argument was missing or malformed
    #[error("invalid argument '{name}': {reason}")]
    InvalidArgument {
        /// Argument name
        name: String,
        /// What is wrong with it
        reason: String,
    },

    /// The recording could not be loaded or read
    #[error("recording error: {0}")]
    Recording(String),

    /// The connection failed or does not support a capability
    #[error("connection error: {0}")]
    Connection(String),

    /// No runtime is registered for this connection ID
    #[error("connection {0} not found")]
    ConnectionNotFound(u32),

    /// A child connection referenced a parent that is not registered
    #[error("parent connection {0} not found")]
    ParentNotFound(u32),

    /// One or more entries of a store request failed
    #[error("{}", .0.join(", "))]
    Store(Vec<String>),

    /// Configuration could not be read or parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Build a compute error for `resource.field`
    pub fn compute(
        resource: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Compute {
            resource: resource.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Build an identity error for `resource`
    pub fn identity(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Identity {
            resource: resource.into(),
            reason: reason.into(),
        }
    }

    /// Build an invalid-argument error
    pub fn invalid_argument(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Attribute a failure to the field whose computation produced it.
    ///
    /// Errors that are already compute errors keep their original context,
    /// so a failure that propagates through several dependent fields still
    /// names the field that actually failed.
    pub fn into_compute(self, resource: &str, field: &str) -> Self {
        match self {
            Error::Compute { .. } => self,
            other => Error::compute(resource, field, other.to_string()),
        }
    }

    /// Attribute a failure to the identity function of `resource`
    pub fn into_identity(self, resource: &str) -> Self {
        match self {
            Error::Identity { .. } => self,
            other => Error::identity(resource, other.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Connection(e.to_string())
    }
}
