//! Wire protocol for factgraph providers
//!
//! This crate defines what crosses the provider boundary:
//! - Messages: `DataReq`/`DataRes`, `StoreReq`/`ResourceData`, `ConnectReq`
//! - FieldFault: the `(resource, field, message)` triple callers see on failure
//! - Envelope: `{id, op, params}` requests and `{id, ok, result | error}` responses
//!
//! The byte transport itself (stdio, sockets, gRPC) is not part of this crate.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod envelope;
pub mod messages;

pub use envelope::{
    ops,
    decode_request, decode_response, encode_request, encode_response, ApiError, DecodeError,
    Request, Response,
};
pub use messages::{ConnectReq, ConnectRes, DataReq, DataRes, FieldFault, ResourceData, StoreReq};
