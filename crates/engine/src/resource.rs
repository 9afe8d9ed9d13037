//! Resource traits
//!
//! A resource is an identified bundle of lazily computed fields. Concrete
//! resource types are plain structs with one [`Slot`](crate::Slot) per field
//! and a `String` id. They implement two traits:
//!
//! - [`Resource`]: object-safe view used by the registry and the dispatch
//!   table. Usually generated with [`impl_resource!`](crate::impl_resource).
//! - [`ResourceSchema`]: the static description of the type, its name, its
//!   field table, its identity function and an optional `init` hook.
//!
//! ```ignore
//! #[derive(Debug, Default)]
//! pub struct User {
//!     id: String,
//!     name: Slot<String>,
//!     home: Slot<String>,
//! }
//! impl_resource!(User);
//!
//! impl ResourceSchema for User {
//!     const NAME: &'static str = "user";
//!     fn fields() -> Vec<FieldDef<Self>> {
//!         vec![
//!             FieldDef::stored("name", Type::String, |r: &User| &r.name),
//!             FieldDef::new("home", Type::String, |r: &User| &r.home, User::home),
//!         ]
//!     }
//!     fn identity(&self, _rt: &Runtime) -> Result<String> { ... }
//! }
//! ```

use crate::field::FieldDef;
use crate::runtime::Runtime;
use factgraph_core::{RawData, ResourceRef, Result};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Reserved argument that supplies a resource ID directly
pub const ID_ARG: &str = "__id";

/// Construction arguments, keyed by field name
pub type Args = BTreeMap<String, RawData>;

/// Object-safe view of a resource instance
pub trait Resource: Any + Send + Sync + fmt::Debug {
    /// Type name (e.g. `certificate`)
    fn type_name(&self) -> &'static str;

    /// ID within the type
    fn id(&self) -> &str;

    /// Assign the ID during construction
    fn assign_id(&mut self, id: String);

    /// Borrow as `Any` for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Convert into `Arc<dyn Any>` for downcasting
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// Reference to this resource
    fn to_ref(&self) -> ResourceRef {
        ResourceRef::new(self.type_name(), self.id())
    }
}

/// Outcome of a type's `init` hook
#[derive(Debug)]
pub enum Init {
    /// Construct from these (possibly rewritten) arguments
    Continue(Args),
    /// `init` produced the resource itself
    Resolved(Arc<dyn Resource>),
}

/// Static description of a resource type
pub trait ResourceSchema: Resource + Default + Sized {
    /// Type name, unique within a provider
    const NAME: &'static str;

    /// Field table: every exposed field with its type, getter, and setter
    fn fields() -> Vec<FieldDef<Self>>;

    /// Compute the ID from the argument-backed fields
    fn identity(&self, rt: &Runtime) -> Result<String>;

    /// Rewrite arguments or resolve the resource before construction.
    ///
    /// Runs only through [`Runtime::new_resource`]; rehydration and store
    /// requests skip it.
    fn init(_rt: &Runtime, args: Args) -> Result<Init> {
        Ok(Init::Continue(args))
    }
}

/// Implement [`Resource`] for a struct with an `id: String` field.
///
/// The type must also implement [`ResourceSchema`].
#[macro_export]
macro_rules! impl_resource {
    ($ty:ty) => {
        impl $crate::Resource for $ty {
            fn type_name(&self) -> &'static str {
                <$ty as $crate::ResourceSchema>::NAME
            }

            fn id(&self) -> &str {
                &self.id
            }

            fn assign_id(&mut self, id: String) {
                self.id = id;
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn into_any(
                self: ::std::sync::Arc<Self>,
            ) -> ::std::sync::Arc<dyn ::std::any::Any + Send + Sync> {
                self
            }
        }
    };
}

/// Downcast a shared resource to its concrete type
pub fn downcast<R: Resource>(resource: Arc<dyn Resource>) -> Option<Arc<R>> {
    resource.into_any().downcast::<R>().ok()
}

/// Downcast a borrowed resource to its concrete type
pub fn downcast_ref<R: Resource>(resource: &dyn Resource) -> Option<&R> {
    resource.as_any().downcast_ref::<R>()
}
