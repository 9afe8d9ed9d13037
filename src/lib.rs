//! factgraph - lazily computed, recording-aware resource graph
//!
//! Providers expose a typed graph of resources (`certificate`, `url`,
//! `file`, ...) whose fields are computed on demand, exactly once, and can be
//! answered from a recording of a previous scan instead.
//!
//! # Quick Start
//!
//! ```ignore
//! use factgraph::{network_service, wire::{ops, ConnectReq, Request}, GraphConfig};
//!
//! let service = network_service(&GraphConfig::default())?;
//! let response = service.handle(&Request::new("1", ops::CONNECT, ConnectReq::default())?);
//! ```
//!
//! # Architecture
//!
//! - `factgraph-core`: values, types, errors
//! - `factgraph-wire`: request/response messages and envelopes
//! - `factgraph-engine`: slots, registry, runtime, recordings, service
//! - `factgraph-network`: the certificate/url/file provider

pub use factgraph_core::{Error, RawData, ResourceRef, Result, Type, Value};
pub use factgraph_engine::{
    Connection, GraphConfig, LocalConnection, MemoryConnection, Provider, RecordingStore,
    Resource, Runtime, Service, CONFIG_FILE_NAME,
};

/// Wire messages and envelopes
pub mod wire {
    pub use factgraph_wire::*;
}

/// The network provider
pub mod network {
    pub use factgraph_network::*;
}

/// Service for the network provider, configured from `factgraph.toml` settings
pub fn network_service(config: &GraphConfig) -> Result<Service> {
    Service::from_config(factgraph_network::provider(), config)
}
