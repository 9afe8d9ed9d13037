//! Per-connection runtime
//!
//! A [`Runtime`] is the context every graph operation runs in. It owns (or,
//! for child connections, shares) the resource registry and holds the
//! connection, the optional recording, and the provider schema.
//!
//! ## Construction
//!
//! [`Runtime::new_resource`] is the full pipeline: factory lookup, argument
//! memo, the type's `init` hook, `create` (argument hydration, identity,
//! recorded fields), then registry insert-if-absent. [`Runtime::create_resource`]
//! skips the memo and `init`; it is used for arguments that are already
//! complete, such as list elements built by another field or resources
//! rebuilt from a recording. Failed constructions never register anything.
//!
//! ## Field access
//!
//! [`Runtime::field`] wraps a slot read: the recording is consulted before the
//! live compute function, and whatever is produced is frozen in the slot.

use crate::config::{GraphConfig, UpstreamConfig};
use crate::connection::Connection;
use crate::field::{from_raw, FieldValue};
use crate::provider::Provider;
use crate::recording::RecordingStore;
use crate::registry::Registry;
use crate::resource::{downcast, Args, Init, Resource, ResourceSchema, ID_ARG};
use crate::slot::{Slot, TValue};
use dashmap::DashMap;
use factgraph_core::{Error, RawData, ResourceRef, Result, Type};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Per-connection graph context
#[derive(Debug)]
pub struct Runtime {
    provider: Arc<Provider>,
    connection: Arc<dyn Connection>,
    resources: Arc<Registry>,
    recording: Option<Arc<RecordingStore>>,
    upstream: Option<UpstreamConfig>,
    /// Argument digest → registry key of the resource those arguments built
    constructed: DashMap<String, String>,
    closed: AtomicBool,
}

/// Builder for [`Runtime`]
pub struct RuntimeBuilder {
    provider: Arc<Provider>,
    connection: Arc<dyn Connection>,
    resources: Option<Arc<Registry>>,
    recording: Option<Arc<RecordingStore>>,
    upstream: Option<UpstreamConfig>,
}

impl RuntimeBuilder {
    /// Replay from this recording
    pub fn recording(mut self, store: Arc<RecordingStore>) -> Self {
        self.recording = Some(store);
        self
    }

    /// Hand these upstream settings to resources
    pub fn upstream(mut self, upstream: UpstreamConfig) -> Self {
        self.upstream = Some(upstream);
        self
    }

    /// Use an existing registry instead of a fresh one
    pub fn registry(mut self, resources: Arc<Registry>) -> Self {
        self.resources = Some(resources);
        self
    }

    /// Finish the runtime
    pub fn build(self) -> Runtime {
        Runtime {
            provider: self.provider,
            connection: self.connection,
            resources: self.resources.unwrap_or_default(),
            recording: self.recording,
            upstream: self.upstream,
            constructed: DashMap::new(),
            closed: AtomicBool::new(false),
        }
    }
}

impl Runtime {
    /// Start building a runtime
    pub fn builder(provider: Arc<Provider>, connection: Arc<dyn Connection>) -> RuntimeBuilder {
        RuntimeBuilder {
            provider,
            connection,
            resources: None,
            recording: None,
            upstream: None,
        }
    }

    /// Runtime with a fresh registry and no recording
    pub fn new(provider: Arc<Provider>, connection: Arc<dyn Connection>) -> Self {
        Self::builder(provider, connection).build()
    }

    /// Runtime configured from `factgraph.toml` settings
    pub fn from_config(
        provider: Arc<Provider>,
        connection: Arc<dyn Connection>,
        config: &GraphConfig,
    ) -> Result<Self> {
        let mut builder = Self::builder(provider, connection);
        if let Some(store) = config.recording_store()? {
            builder = builder.recording(Arc::new(store));
        }
        if let Some(upstream) = &config.upstream {
            builder = builder.upstream(upstream.clone());
        }
        Ok(builder.build())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Provider schema
    pub fn provider(&self) -> &Arc<Provider> {
        &self.provider
    }

    /// Connection to the target
    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    /// Resource registry
    pub fn registry(&self) -> &Arc<Registry> {
        &self.resources
    }

    /// Recording in use, if any
    pub fn recording(&self) -> Option<&RecordingStore> {
        self.recording.as_deref()
    }

    /// Whether a recording is attached
    pub fn has_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// Upstream settings, if any
    pub fn upstream(&self) -> Option<&UpstreamConfig> {
        self.upstream.as_ref()
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Construct a resource through the full pipeline.
    ///
    /// Constructing with the same arguments again returns the registered
    /// instance without running `init` or identity a second time.
    pub fn new_resource(&self, name: &str, args: Args) -> Result<Arc<dyn Resource>> {
        let factory = self.provider.factory(name)?;

        let memo = args_digest(name, &args)?;
        if let Some(key) = self.constructed.get(&memo) {
            if let Some(existing) = self.resources.get_key(key.value()) {
                return Ok(existing);
            }
        }

        let built = match (factory.init)(self, args)? {
            Init::Continue(args) => (factory.create)(self, args)?,
            Init::Resolved(resource) => resource,
        };
        let resource = self.resources.insert_if_absent(built);
        self.constructed
            .insert(memo, Registry::key(resource.type_name(), resource.id()));
        Ok(resource)
    }

    /// Construct a resource from complete arguments, skipping `init`
    pub fn create_resource(&self, name: &str, args: Args) -> Result<Arc<dyn Resource>> {
        let factory = self.provider.factory(name)?;
        let built = (factory.create)(self, args)?;
        Ok(self.resources.insert_if_absent(built))
    }

    /// Typed [`Runtime::new_resource`]
    pub fn new_typed<R: ResourceSchema>(&self, args: Args) -> Result<Arc<R>> {
        typed::<R>(self.new_resource(R::NAME, args)?)
    }

    /// Typed [`Runtime::create_resource`]
    pub fn create_typed<R: ResourceSchema>(&self, args: Args) -> Result<Arc<R>> {
        typed::<R>(self.create_resource(R::NAME, args)?)
    }

    /// Registered resource, if any
    pub fn lookup(&self, name: &str, id: &str) -> Option<Arc<dyn Resource>> {
        self.resources.get(name, id)
    }

    /// Registered resource, or one rebuilt from the recording.
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` when neither the registry nor the recording knows it.
    pub fn find(&self, name: &str, id: &str) -> Result<Arc<dyn Resource>> {
        if let Some(resource) = self.resources.get(name, id) {
            return Ok(resource);
        }
        if self
            .recording
            .as_ref()
            .is_some_and(|store| store.resource(name, id).is_some())
        {
            debug!(
                target: "factgraph::recording",
                resource = name,
                id,
                "Rebuilding resource from recording"
            );
            let mut args = Args::new();
            args.insert(ID_ARG.to_string(), RawData::string(id));
            return self.create_resource(name, args);
        }
        Err(Error::ResourceNotFound {
            resource: name.to_string(),
            id: id.to_string(),
        })
    }

    /// Resolve a reference to its typed resource
    pub fn resolve<R: ResourceSchema>(&self, reference: &ResourceRef) -> Result<Arc<R>> {
        typed::<R>(self.find(&reference.name, &reference.id)?)
    }

    // ========================================================================
    // Field access
    // ========================================================================

    /// Read `field` of `resource` through its slot.
    ///
    /// Order: frozen slot, then recorded value, then `compute`. Compute
    /// errors are attributed to `resource.field` and frozen like values.
    pub fn field<R, T, F>(&self, resource: &R, field: &str, slot: &Slot<T>, compute: F) -> TValue<T>
    where
        R: ResourceSchema,
        T: FieldValue,
        F: FnOnce() -> Result<Option<T>>,
    {
        slot.get_or_compute(|| {
            if let Some(recorded) = self.replay::<T>(R::NAME, resource.id(), field) {
                return recorded;
            }
            compute().map_err(|e| e.into_compute(R::NAME, field))
        })
    }

    fn replay<T: FieldValue>(
        &self,
        resource: &str,
        id: &str,
        field: &str,
    ) -> Option<Result<Option<T>>> {
        let store = self.recording.as_ref()?;
        let raw = store.field(resource, id, field)?;
        let ty = self
            .provider
            .field_type(resource, field)
            .cloned()
            .unwrap_or(Type::Any);
        match from_raw::<T>(resource, field, &ty, raw) {
            Ok(value) => {
                debug!(target: "factgraph::recording", resource, id, field, "Field replayed");
                Some(value.into_result())
            }
            Err(e) => {
                warn!(
                    target: "factgraph::recording",
                    resource,
                    id,
                    field,
                    error = %e,
                    "Recorded value unusable, computing live"
                );
                None
            }
        }
    }

    /// Apply recorded fields to a freshly created resource.
    ///
    /// Unknown fields and values that do not fit are skipped.
    pub(crate) fn hydrate(&self, resource: &dyn Resource, recorded: &Args) {
        for (field, raw) in recorded {
            let Some(entry) = self.provider.field(resource.type_name(), field) else {
                continue;
            };
            if let Some(Err(e)) = (entry.set)(resource, raw.clone()) {
                warn!(
                    target: "factgraph::recording",
                    resource = resource.type_name(),
                    id = resource.id(),
                    field = field.as_str(),
                    error = %e,
                    "Skipping recorded field"
                );
            }
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Close the connection and forget constructed argument sets.
    ///
    /// Closing twice is a no-op.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.constructed.clear();
        self.connection.close();
        info!(
            target: "factgraph::runtime",
            connection = self.connection.id(),
            resources = self.resources.len(),
            "Runtime closed"
        );
    }

    /// Whether [`Runtime::close`] was called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

fn typed<R: ResourceSchema>(resource: Arc<dyn Resource>) -> Result<Arc<R>> {
    let id = resource.id().to_string();
    downcast::<R>(resource).ok_or_else(|| Error::ResourceNotFound {
        resource: R::NAME.to_string(),
        id,
    })
}

/// Digest of a type name and its construction arguments
fn args_digest(name: &str, args: &Args) -> Result<String> {
    let encoded = serde_json::to_vec(args)?;
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update([0u8]);
    hasher.update(&encoded);
    Ok(hex::encode(hasher.finalize()))
}
