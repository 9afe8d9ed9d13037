//! Provider service: one runtime per connection
//!
//! The service is the provider's entry point for the transport layer. It keeps
//! a runtime for every registered connection, answers field and store
//! requests against the right runtime, and maps wire envelopes onto those
//! operations in [`Service::handle`].
//!
//! Child connections (a connection whose `parent_id` is set) share the
//! registry of their parent, so resources discovered through the parent are
//! visible to the child without being rebuilt.

use crate::config::{GraphConfig, UpstreamConfig};
use crate::connection::{Connection, LocalConnection};
use crate::provider::Provider;
use crate::recording::RecordingStore;
use crate::resource::ID_ARG;
use crate::runtime::Runtime;
use dashmap::DashMap;
use factgraph_core::{Error, RawData, Result};
use factgraph_wire::envelope::ops;
use factgraph_wire::{
    ApiError, ConnectReq, ConnectRes, DataReq, DataRes, Request, Response, StoreReq,
};
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builds the connection for a connect request
pub type Connector = Box<dyn Fn(&ConnectReq, u32) -> Result<Arc<dyn Connection>> + Send + Sync>;

/// Per-connection runtimes of one provider
pub struct Service {
    provider: Arc<Provider>,
    runtimes: DashMap<u32, Arc<Runtime>>,
    last_connection_id: AtomicU32,
    /// Serializes runtime registration
    lock: Mutex<()>,
    recording: Option<Arc<RecordingStore>>,
    upstream: Option<UpstreamConfig>,
    connector: Connector,
}

impl Service {
    /// Service for `provider`; connect requests open local connections
    pub fn new(provider: Provider) -> Self {
        Service {
            provider: Arc::new(provider),
            runtimes: DashMap::new(),
            last_connection_id: AtomicU32::new(0),
            lock: Mutex::new(()),
            recording: None,
            upstream: None,
            connector: Box::new(|req, id| {
                let mut conn = LocalConnection::new(id);
                if let Some(parent) = req.parent_id {
                    conn = conn.with_parent(parent);
                }
                if !req.name.is_empty() {
                    conn = conn.with_name(req.name.clone());
                }
                Ok(Arc::new(conn) as Arc<dyn Connection>)
            }),
        }
    }

    /// Service configured from `factgraph.toml` settings
    pub fn from_config(provider: Provider, config: &GraphConfig) -> Result<Self> {
        let mut service = Self::new(provider);
        service.recording = config.recording_store()?.map(Arc::new);
        service.upstream = config.upstream.clone();
        Ok(service)
    }

    /// Replay this recording in every runtime
    pub fn with_recording(mut self, store: RecordingStore) -> Self {
        self.recording = Some(Arc::new(store));
        self
    }

    /// Build connections for connect requests with `connector`
    pub fn with_connector<F>(mut self, connector: F) -> Self
    where
        F: Fn(&ConnectReq, u32) -> Result<Arc<dyn Connection>> + Send + Sync + 'static,
    {
        self.connector = Box::new(connector);
        self
    }

    /// Provider schema
    pub fn provider(&self) -> &Arc<Provider> {
        &self.provider
    }

    // ========================================================================
    // Runtimes
    // ========================================================================

    /// Register a runtime for connection `id`.
    ///
    /// - an already registered `id` returns the existing runtime
    /// - `id == 0` allocates the next free ID
    /// - a connection with a parent shares the parent's registry
    ///
    /// `connect` receives the final ID and builds the connection.
    pub fn add_runtime<F>(&self, id: u32, connect: F) -> Result<Arc<Runtime>>
    where
        F: FnOnce(u32) -> Result<Arc<dyn Connection>>,
    {
        let _guard = self.lock.lock();

        if id > 0 {
            if let Some(existing) = self.runtimes.get(&id) {
                return Ok(Arc::clone(existing.value()));
            }
        }

        let id = if id == 0 {
            self.last_connection_id.fetch_add(1, Ordering::SeqCst) + 1
        } else {
            self.last_connection_id.fetch_max(id, Ordering::SeqCst);
            id
        };

        let connection = connect(id)?;
        let mut builder = Runtime::builder(Arc::clone(&self.provider), Arc::clone(&connection));
        if let Some(parent_id) = connection.parent_id() {
            let parent = self
                .runtimes
                .get(&parent_id)
                .map(|entry| Arc::clone(entry.value()))
                .ok_or(Error::ParentNotFound(parent_id))?;
            builder = builder.registry(Arc::clone(parent.registry()));
        }
        if let Some(store) = &self.recording {
            builder = builder.recording(Arc::clone(store));
        }
        if let Some(upstream) = &self.upstream {
            builder = builder.upstream(upstream.clone());
        }

        let runtime = Arc::new(builder.build());
        self.runtimes.insert(id, Arc::clone(&runtime));
        info!(
            target: "factgraph::service",
            connection = id,
            parent = ?connection.parent_id(),
            name = connection.name(),
            "Runtime added"
        );
        Ok(runtime)
    }

    /// Runtime of connection `id`
    pub fn get_runtime(&self, id: u32) -> Result<Arc<Runtime>> {
        self.runtimes
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(Error::ConnectionNotFound(id))
    }

    /// Close and drop the runtime of connection `id`
    pub fn disconnect(&self, id: u32) -> Result<()> {
        let (_, runtime) = self
            .runtimes
            .remove(&id)
            .ok_or(Error::ConnectionNotFound(id))?;
        runtime.close();
        Ok(())
    }

    /// Number of registered runtimes
    pub fn runtime_count(&self) -> usize {
        self.runtimes.len()
    }

    /// Close every runtime
    pub fn shutdown(&self) {
        let ids: Vec<u32> = self.runtimes.iter().map(|entry| *entry.key()).collect();
        for id in ids {
            if let Some((_, runtime)) = self.runtimes.remove(&id) {
                runtime.close();
            }
        }
        info!(target: "factgraph::service", "Service shut down");
    }

    // ========================================================================
    // Requests
    // ========================================================================

    /// Answer a field request.
    ///
    /// An empty `resource_id` and `field` constructs the resource from `args`
    /// and answers with a reference to it. Failures of the field itself are
    /// part of the answer; `Err` is reserved for requests that cannot be
    /// routed (unknown connection or resource).
    pub fn get_data(&self, req: &DataReq) -> Result<DataRes> {
        let runtime = self.get_runtime(req.connection)?;

        if req.is_construct() {
            let resource = runtime.new_resource(&req.resource, req.args.clone())?;
            return Ok(DataRes::data(RawData::resource(
                resource.type_name(),
                resource.id(),
            )));
        }

        let resource = runtime.find(&req.resource, &req.resource_id)?;
        Ok(runtime.get_data(resource.as_ref(), &req.field))
    }

    /// Create or update resources from a store request.
    ///
    /// Every entry is attempted; failures are collected into one `Store` error.
    pub fn store_data(&self, req: &StoreReq) -> Result<()> {
        let runtime = self.get_runtime(req.connection)?;
        let mut errors = Vec::new();

        for info in &req.resources {
            if info.id.is_empty() {
                errors.push(format!("failed to add cached {}, missing id", info.name));
                continue;
            }

            match runtime.lookup(&info.name, &info.id) {
                Some(resource) => {
                    if let Err(e) = runtime.set_all_data(resource.as_ref(), info.fields.clone()) {
                        errors.push(format!(
                            "failed to add cached {} (id: {}), field error: {}",
                            info.name, info.id, e
                        ));
                    }
                }
                None => {
                    let mut args = info.fields.clone();
                    args.insert(ID_ARG.to_string(), RawData::string(info.id.clone()));
                    if let Err(e) = runtime.create_resource(&info.name, args) {
                        errors.push(format!(
                            "failed to add cached {} (id: {}), creation failed: {}",
                            info.name, info.id, e
                        ));
                    }
                }
            }
        }

        debug!(
            target: "factgraph::service",
            connection = req.connection,
            resources = req.resources.len(),
            failed = errors.len(),
            "Store request applied"
        );

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Store(errors))
        }
    }

    /// Answer a wire request
    pub fn handle(&self, request: &Request) -> Response {
        let result = match request.op.as_str() {
            ops::PING => Ok(serde_json::Value::Null),
            ops::CONNECT => self.handle_connect(request),
            ops::DISCONNECT => self.handle_disconnect(request),
            ops::GET_DATA => request
                .params::<DataReq>()
                .map_err(|e| ApiError::new("InvalidParams", e.to_string()))
                .and_then(|req| self.get_data(&req).map_err(api_error))
                .and_then(to_result),
            ops::STORE_DATA => request
                .params::<StoreReq>()
                .map_err(|e| ApiError::new("InvalidParams", e.to_string()))
                .and_then(|req| self.store_data(&req).map_err(api_error))
                .map(|_| serde_json::Value::Null),
            other => Err(ApiError::new(
                "UnknownOp",
                format!("unknown operation '{other}'"),
            )),
        };

        match result {
            Ok(value) => Response::success(&request.id, value),
            Err(error) => {
                warn!(
                    target: "factgraph::service",
                    op = request.op.as_str(),
                    code = error.code.as_str(),
                    message = error.message.as_str(),
                    "Request failed"
                );
                Response::error(&request.id, error)
            }
        }
    }

    fn handle_connect(&self, request: &Request) -> std::result::Result<serde_json::Value, ApiError> {
        let req: ConnectReq = request
            .params()
            .map_err(|e| ApiError::new("InvalidParams", e.to_string()))?;
        let runtime = self
            .add_runtime(req.id, |id| (self.connector)(&req, id))
            .map_err(api_error)?;
        let connection = runtime.connection();
        to_result(ConnectRes {
            id: connection.id(),
            name: connection.name().to_string(),
        })
    }

    fn handle_disconnect(
        &self,
        request: &Request,
    ) -> std::result::Result<serde_json::Value, ApiError> {
        #[derive(Deserialize)]
        struct DisconnectParams {
            connection: u32,
        }
        let params: DisconnectParams = request
            .params()
            .map_err(|e| ApiError::new("InvalidParams", e.to_string()))?;
        self.disconnect(params.connection).map_err(api_error)?;
        Ok(serde_json::Value::Null)
    }
}

fn to_result<T: serde::Serialize>(value: T) -> std::result::Result<serde_json::Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::new("Internal", e.to_string()))
}

/// Map a graph error onto a wire error code
fn api_error(error: Error) -> ApiError {
    let code = match &error {
        Error::ConnectionNotFound(_) | Error::ParentNotFound(_) => "NotFound",
        Error::ResourceNotFound { .. } | Error::UnknownResource { .. } => "NotFound",
        Error::Dispatch { .. } => "NotFound",
        Error::InvalidArgument { .. } | Error::TypeMismatch { .. } => "InvalidArgument",
        Error::Identity { .. } => "InvalidArgument",
        Error::Store(_) => "StoreFailed",
        Error::Compute { .. } | Error::Connection(_) => "Failed",
        Error::Recording(_) | Error::Config(_) | Error::Serialization(_) => "Internal",
    };
    let details = serde_json::to_value(&error).ok();
    ApiError {
        code: code.to_string(),
        message: error.to_string(),
        details,
    }
}

impl Drop for Service {
    fn drop(&mut self) {
        for entry in self.runtimes.iter() {
            entry.value().close();
        }
    }
}
