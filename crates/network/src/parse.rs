//! `parse.certificates` resource
//!
//! Certificates read from a file on the target or from inline content.
//! Inline content is wrapped in a virtual `file` at `in-memory://<sha256>`.

use crate::certificate::{Certificate, Certificates};
use crate::file::File;
use crate::pem;
use factgraph_core::{Error, RawData, ResourceRef, Result, Type, Value};
use factgraph_engine::{
    impl_resource, Args, FieldDef, Init, Resource, ResourceSchema, Runtime, Slot, TValue,
};
use tracing::debug;

const VIRTUAL_SCHEME: &str = "in-memory://";

/// Certificates parsed from a file
#[derive(Debug, Default)]
pub struct ParseCertificates {
    id: String,
    path: Slot<String>,
    file: Slot<ResourceRef>,
    content: Slot<String>,
    list: Slot<Vec<ResourceRef>>,
}

impl_resource!(ParseCertificates);

impl ParseCertificates {
    /// Path of the source file
    pub fn path(&self, rt: &Runtime) -> TValue<String> {
        rt.field(self, "path", &self.path, || Ok(None))
    }

    /// Source `file`
    pub fn file(&self, rt: &Runtime) -> TValue<ResourceRef> {
        rt.field(self, "file", &self.file, || {
            let Some(path) = self.path(rt).into_result()? else {
                return Ok(None);
            };
            let mut args = Args::new();
            args.insert("path".into(), RawData::string(path));
            Ok(Some(rt.create_typed::<File>(args)?.to_ref()))
        })
    }

    /// Text of the source file
    pub fn content(&self, rt: &Runtime) -> TValue<String> {
        rt.field(self, "content", &self.content, || {
            let Some(file) = self.file(rt).into_result()? else {
                return Ok(None);
            };
            rt.resolve::<File>(&file)?.content(rt).into_result()
        })
    }

    /// Certificates found in the content
    pub fn list(&self, rt: &Runtime) -> TValue<Vec<ResourceRef>> {
        rt.field(self, "list", &self.list, || {
            let Some(content) = self.content(rt).into_result()? else {
                return Ok(None);
            };
            let mut args = Args::new();
            args.insert("pem".into(), RawData::string(content));
            rt.new_typed::<Certificates>(args)?.list(rt).into_result()
        })
    }
}

impl ResourceSchema for ParseCertificates {
    const NAME: &'static str = "parse.certificates";

    fn fields() -> Vec<FieldDef<Self>> {
        vec![
            FieldDef::stored("path", Type::String, |r: &Self| &r.path),
            FieldDef::new(
                "file",
                Type::resource(File::NAME),
                |r: &Self| &r.file,
                Self::file,
            ),
            FieldDef::new("content", Type::String, |r: &Self| &r.content, Self::content),
            FieldDef::new(
                "list",
                Type::array(Type::resource(Certificate::NAME)),
                |r: &Self| &r.list,
                Self::list,
            ),
        ]
    }

    fn identity(&self, rt: &Runtime) -> Result<String> {
        let path = self
            .path(rt)
            .into_result()?
            .ok_or_else(|| Error::invalid_argument("path", "required"))?;
        Ok(format!("certificates:{path}"))
    }

    fn init(rt: &Runtime, mut args: Args) -> Result<Init> {
        if args.contains_key("path") {
            return Ok(Init::Continue(args));
        }
        let content = match args.remove("content").map(|raw| raw.value) {
            Some(Value::String(content)) => content,
            Some(other) => {
                return Err(Error::invalid_argument(
                    "content",
                    format!("expected string, got {}", other.kind()),
                ))
            }
            None => {
                return Err(Error::invalid_argument(
                    "path",
                    "missing 'path' or 'content' argument",
                ))
            }
        };

        let path = format!("{VIRTUAL_SCHEME}{}", pem::sha256_hex(&content));
        debug!(target: "factgraph::network", path = %path, "Wrapping inline certificates");
        let file = rt.create_typed::<File>(File::virtual_args(path.clone(), content.clone()))?;

        args.insert("path".into(), RawData::string(path));
        args.insert(
            "file".into(),
            RawData::resource(File::NAME, file.id().to_string()),
        );
        args.insert("content".into(), RawData::string(content));
        Ok(Init::Continue(args))
    }
}
