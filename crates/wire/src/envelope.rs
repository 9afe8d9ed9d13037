//! Request/Response envelope encoding for the provider protocol
//!
//! Defines the wire format for provider requests and responses:
//! - Request: `{id, op, params}`
//! - Success response: `{id, ok: true, result}`
//! - Error response: `{id, ok: false, error: {code, message, details}}`

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Operation names understood by a provider service
pub mod ops {
    /// Liveness check, no params
    pub const PING: &str = "ping";
    /// Register a connection, params: `ConnectReq`
    pub const CONNECT: &str = "connection.add";
    /// Drop a connection, params: `{"connection": id}`
    pub const DISCONNECT: &str = "connection.close";
    /// Field request, params: `DataReq`
    pub const GET_DATA: &str = "data.get";
    /// Store request, params: `StoreReq`
    pub const STORE_DATA: &str = "data.store";
}

/// Envelope decoding failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Input is not a valid envelope
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    /// Params do not match the operation
    #[error("invalid params for '{op}': {reason}")]
    InvalidParams {
        /// Operation name
        op: String,
        /// What did not match
        reason: String,
    },
}

/// Wire protocol request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Request ID (echoed in response)
    pub id: String,
    /// Operation name (see [`ops`])
    pub op: String,
    /// Operation parameters
    #[serde(default)]
    pub params: Value,
}

impl Request {
    /// Build a request with typed params
    ///
    /// Fails when `params` cannot be represented as JSON.
    pub fn new(
        id: impl Into<String>,
        op: impl Into<String>,
        params: impl Serialize,
    ) -> Result<Self, DecodeError> {
        let op = op.into();
        let params = serde_json::to_value(params).map_err(|e| DecodeError::InvalidParams {
            op: op.clone(),
            reason: e.to_string(),
        })?;
        Ok(Request {
            id: id.into(),
            op,
            params,
        })
    }

    /// Decode params into the type the operation expects
    pub fn params<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        serde_json::from_value(self.params.clone()).map_err(|e| DecodeError::InvalidParams {
            op: self.op.clone(),
            reason: e.to_string(),
        })
    }
}

/// Wire protocol response
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Request ID (from request)
    pub id: String,
    /// Success or failure
    pub ok: bool,
    /// Result (if ok=true)
    pub result: Option<Value>,
    /// Error (if ok=false)
    pub error: Option<ApiError>,
}

/// API error structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code (e.g., "NotFound", "InvalidParams")
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Additional error details
    #[serde(default)]
    pub details: Option<Value>,
}

impl ApiError {
    /// Error without details
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }
}

impl Response {
    /// Create a success response
    pub fn success(id: &str, result: Value) -> Self {
        Response {
            id: id.to_string(),
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: &str, error: ApiError) -> Self {
        Response {
            id: id.to_string(),
            ok: false,
            result: None,
            error: Some(error),
        }
    }

    /// Decode the result into a typed value
    pub fn result<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        serde_json::from_value(self.result.clone().unwrap_or(Value::Null))
            .map_err(|e| DecodeError::InvalidJson(e.to_string()))
    }
}

/// Encode a request to JSON
pub fn encode_request(request: &Request) -> String {
    json!({
        "id": request.id,
        "op": request.op,
        "params": request.params,
    })
    .to_string()
}

/// Encode a response to JSON
pub fn encode_response(response: &Response) -> String {
    if response.ok {
        json!({
            "id": response.id,
            "ok": true,
            "result": response.result.as_ref().unwrap_or(&Value::Null),
        })
        .to_string()
    } else {
        // Default error for malformed responses (ok=false but no error provided)
        let default_error = ApiError::new("Internal", "Unknown error");
        let error = response.error.as_ref().unwrap_or(&default_error);
        json!({
            "id": response.id,
            "ok": false,
            "error": error,
        })
        .to_string()
    }
}

/// Decode a request from JSON
pub fn decode_request(text: &str) -> Result<Request, DecodeError> {
    serde_json::from_str(text).map_err(|e| DecodeError::InvalidJson(e.to_string()))
}

#[derive(Deserialize)]
struct ResponseRepr {
    id: String,
    ok: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ApiError>,
}

/// Decode a response from JSON
pub fn decode_response(text: &str) -> Result<Response, DecodeError> {
    let repr: ResponseRepr =
        serde_json::from_str(text).map_err(|e| DecodeError::InvalidJson(e.to_string()))?;

    if repr.ok {
        Ok(Response {
            id: repr.id,
            ok: true,
            result: repr.result,
            error: None,
        })
    } else {
        let error = repr.error.ok_or_else(|| {
            DecodeError::InvalidJson("Missing 'error' in failed response".to_string())
        })?;
        Ok(Response {
            id: repr.id,
            ok: false,
            result: None,
            error: Some(error),
        })
    }
}
