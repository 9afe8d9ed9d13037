//! Core types for the resource graph
//!
//! This crate defines the data model shared by the engine, the wire protocol,
//! and every provider:
//! - Type: type descriptors with stable text labels
//! - Value: closed enum for field data
//! - ResourceRef: `(type, id)` reference to another resource
//! - RawData: typed value plus optional error, exchanged at every boundary
//! - Error: error type hierarchy
//! - JSON codec for RawData used by recordings and the wire

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod json;
pub mod types;
pub mod value;

pub use error::{Error, Result};
pub use json::{value_from_json, value_to_json};
pub use types::Type;
pub use value::{RawData, ResourceRef, Value};
