//! Provider schema: resource factories and the field dispatch table
//!
//! A [`Provider`] is built once from the typed resource registrations and is
//! read-only afterwards. It maps:
//! - type name → factory (`init` hook + `create`)
//! - `"type.field"` → type-erased getter and setter

use crate::field::FieldDef;
use crate::resource::{downcast_ref, Args, Init, Resource, ResourceSchema, ID_ARG};
use crate::runtime::Runtime;
use factgraph_core::{Error, RawData, Result, Type};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type ErasedGetter = Box<dyn Fn(&dyn Resource, &Runtime) -> Option<RawData> + Send + Sync>;
type ErasedSetter = Box<dyn Fn(&dyn Resource, RawData) -> Option<Result<()>> + Send + Sync>;

/// Entry of the dispatch table
pub(crate) struct ErasedField {
    pub(crate) ty: Type,
    pub(crate) get: ErasedGetter,
    pub(crate) set: ErasedSetter,
}

/// Construction entry points of one resource type
pub(crate) struct Factory {
    pub(crate) init: fn(&Runtime, Args) -> Result<Init>,
    pub(crate) create: fn(&Runtime, Args) -> Result<Arc<dyn Resource>>,
    pub(crate) fields: Vec<&'static str>,
}

/// Schema of one provider
pub struct Provider {
    name: String,
    factories: HashMap<&'static str, Factory>,
    fields: HashMap<String, ErasedField>,
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut resources: Vec<_> = self.factories.keys().collect();
        resources.sort();
        f.debug_struct("Provider")
            .field("name", &self.name)
            .field("resources", &resources)
            .finish()
    }
}

impl Provider {
    /// Start building a provider
    pub fn builder(name: impl Into<String>) -> ProviderBuilder {
        ProviderBuilder {
            provider: Provider {
                name: name.into(),
                factories: HashMap::new(),
                fields: HashMap::new(),
            },
        }
    }

    /// Provider name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a resource type is registered
    pub fn has_resource(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered resource type names, sorted
    pub fn resource_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Field names of a resource type, in declaration order
    pub fn field_names(&self, resource: &str) -> Option<&[&'static str]> {
        self.factories.get(resource).map(|f| f.fields.as_slice())
    }

    /// Declared type of `resource.field`
    pub fn field_type(&self, resource: &str, field: &str) -> Option<&Type> {
        self.field(resource, field).map(|f| &f.ty)
    }

    pub(crate) fn factory(&self, resource: &str) -> Result<&Factory> {
        self.factories
            .get(resource)
            .ok_or_else(|| Error::UnknownResource {
                resource: resource.to_string(),
            })
    }

    pub(crate) fn field(&self, resource: &str, field: &str) -> Option<&ErasedField> {
        self.fields.get(&field_key(resource, field))
    }
}

fn field_key(resource: &str, field: &str) -> String {
    format!("{resource}.{field}")
}

/// Builder collecting typed registrations
pub struct ProviderBuilder {
    provider: Provider,
}

impl ProviderBuilder {
    /// Register resource type `R` with its fields
    pub fn resource<R: ResourceSchema>(mut self) -> Self {
        let defs = R::fields();
        let mut names = Vec::with_capacity(defs.len());
        for def in defs {
            names.push(def.name);
            self.provider
                .fields
                .insert(field_key(R::NAME, def.name), erase(def));
        }
        self.provider.factories.insert(
            R::NAME,
            Factory {
                init: R::init,
                create: create::<R>,
                fields: names,
            },
        );
        self
    }

    /// Finish the schema
    pub fn build(self) -> Provider {
        self.provider
    }
}

fn erase<R: ResourceSchema>(def: FieldDef<R>) -> ErasedField {
    let FieldDef { ty, get, set, .. } = def;
    ErasedField {
        ty,
        get: Box::new(move |res, rt| downcast_ref::<R>(res).map(|r| get(r, rt))),
        set: Box::new(move |res, raw| downcast_ref::<R>(res).map(|r| set(r, raw))),
    }
}

/// Allocate `R`, hydrate its argument-backed slots, assign its ID, and
/// hydrate recorded fields when a recording holds this resource.
fn create<R: ResourceSchema>(rt: &Runtime, mut args: Args) -> Result<Arc<dyn Resource>> {
    let mut resource = R::default();

    let explicit_id = match args.remove(ID_ARG) {
        Some(raw) => Some(
            raw.into_result()?
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| Error::invalid_argument(ID_ARG, "must be a string"))?,
        ),
        None => None,
    };

    rt.set_all_data(&resource, args)?;

    let id = match explicit_id {
        Some(id) => id,
        None => resource
            .identity(rt)
            .map_err(|e| e.into_identity(R::NAME))?,
    };
    resource.assign_id(id);

    if let Some(recorded) = rt
        .recording()
        .and_then(|store| store.resource(R::NAME, resource.id()))
    {
        rt.hydrate(&resource, recorded);
    }

    Ok(Arc::new(resource))
}
