//! Resource graph engine
//!
//! This crate runs the resource graph of a provider:
//! - Slot / TValue: memoized field cells with frozen values, nulls, and errors
//! - ComputeGroup: one computation that fills several fields of a resource
//! - Resource / ResourceSchema: object-safe instance view and static type description
//! - Provider: factories and the `"type.field"` dispatch table
//! - Registry: concurrent `(type, id)` → instance map with insert-if-absent
//! - Runtime: per-connection context, construction pipeline, replay-aware field reads
//! - RecordingStore: read-only snapshot of a previous scan
//! - Service: per-connection runtimes behind the wire protocol
//! - Connection: capability handle for the scanned target
//!
//! The engine knows nothing about concrete resources; providers register
//! their types with [`Provider::builder`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod connection;
mod dispatch;
pub mod field;
pub mod provider;
pub mod recording;
pub mod registry;
pub mod resource;
pub mod runtime;
pub mod service;
pub mod slot;

pub use config::{GraphConfig, RecordingConfig, UpstreamConfig, CONFIG_FILE_NAME};
pub use connection::{CommandOutput, Connection, FileInfo, LocalConnection, MemoryConnection};
pub use field::{FieldDef, FieldValue};
pub use provider::{Provider, ProviderBuilder};
pub use recording::{AssetRecording, RecordingFile, RecordingStore, ResourceRecording};
pub use registry::Registry;
pub use resource::{downcast, downcast_ref, Args, Init, Resource, ResourceSchema, ID_ARG};
pub use runtime::{Runtime, RuntimeBuilder};
pub use service::{Connector, Service};
pub use slot::{ComputeGroup, Slot, SlotState, TValue};
