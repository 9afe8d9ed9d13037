//! String-keyed field dispatch
//!
//! Callers outside the process (and anything that only knows field names)
//! read and write fields through the provider's `"type.field"` table. Unknown
//! fields and mismatched values come back as errors naming the type and
//! field; dispatch never panics.

use crate::resource::{Args, Resource};
use crate::runtime::Runtime;
use factgraph_core::{Error, RawData, Result};
use factgraph_wire::{DataRes, FieldFault};

impl Runtime {
    /// Read `field` of `resource`, computing it if needed
    pub fn get_data(&self, resource: &dyn Resource, field: &str) -> DataRes {
        let name = resource.type_name();
        let raw = self
            .provider()
            .field(name, field)
            .and_then(|entry| (entry.get)(resource, self));

        match raw {
            None => DataRes::fault(FieldFault::new(name, field, &dispatch_error(name, field))),
            Some(RawData {
                error: Some(error), ..
            }) => DataRes::fault(FieldFault::new(name, field, &error)),
            Some(raw) => DataRes::data(raw),
        }
    }

    /// Overwrite `field` of `resource`
    pub fn set_data(&self, resource: &dyn Resource, field: &str, raw: RawData) -> Result<()> {
        let name = resource.type_name();
        self.provider()
            .field(name, field)
            .and_then(|entry| (entry.set)(resource, raw))
            .unwrap_or_else(|| Err(dispatch_error(name, field)))
    }

    /// Apply every argument in key order, stopping at the first error.
    ///
    /// Fields applied before the failing one stay applied.
    pub fn set_all_data(&self, resource: &dyn Resource, args: Args) -> Result<()> {
        for (field, raw) in args {
            self.set_data(resource, &field, raw)?;
        }
        Ok(())
    }
}

fn dispatch_error(resource: &str, field: &str) -> Error {
    Error::Dispatch {
        resource: resource.to_string(),
        field: field.to_string(),
    }
}
