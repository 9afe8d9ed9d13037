//! `file` resource, read through the runtime's connection

use factgraph_core::{Error, RawData, Result, Type};
use factgraph_engine::{impl_resource, Args, FieldDef, ResourceSchema, Runtime, Slot, TValue};
use tracing::debug;

/// A file on the target
#[derive(Debug, Default)]
pub struct File {
    id: String,
    path: Slot<String>,
    content: Slot<String>,
    exists: Slot<bool>,
    size: Slot<i64>,
}

impl_resource!(File);

impl File {
    /// Arguments for a file that exists only in memory
    pub fn virtual_args(path: impl Into<String>, content: impl Into<String>) -> Args {
        let content = content.into();
        let mut args = Args::new();
        args.insert("path".into(), RawData::string(path));
        args.insert("size".into(), RawData::int(content.len() as i64));
        args.insert("content".into(), RawData::string(content));
        args.insert("exists".into(), RawData::bool(true));
        args
    }

    /// Absolute path
    pub fn path(&self, rt: &Runtime) -> TValue<String> {
        rt.field(self, "path", &self.path, || Ok(None))
    }

    /// Content as UTF-8 text
    pub fn content(&self, rt: &Runtime) -> TValue<String> {
        rt.field(self, "content", &self.content, || {
            let path = self.require_path(rt)?;
            let bytes = rt.connection().read_file(&path)?;
            debug!(target: "factgraph::network", path = %path, bytes = bytes.len(), "Read file");
            String::from_utf8(bytes)
                .map(Some)
                .map_err(|e| Error::compute(Self::NAME, "content", e.to_string()))
        })
    }

    /// Whether the path exists
    pub fn exists(&self, rt: &Runtime) -> TValue<bool> {
        rt.field(self, "exists", &self.exists, || {
            let path = self.require_path(rt)?;
            Ok(Some(rt.connection().stat(&path)?.is_some()))
        })
    }

    /// Size in bytes
    pub fn size(&self, rt: &Runtime) -> TValue<i64> {
        rt.field(self, "size", &self.size, || {
            let path = self.require_path(rt)?;
            match rt.connection().stat(&path)? {
                Some(info) => Ok(Some(info.size as i64)),
                None => Err(Error::compute(
                    Self::NAME,
                    "size",
                    format!("file '{path}' does not exist"),
                )),
            }
        })
    }

    fn require_path(&self, rt: &Runtime) -> Result<String> {
        self.path(rt)
            .into_result()?
            .ok_or_else(|| Error::invalid_argument("path", "required"))
    }
}

impl ResourceSchema for File {
    const NAME: &'static str = "file";

    fn fields() -> Vec<FieldDef<Self>> {
        vec![
            FieldDef::stored("path", Type::String, |r: &Self| &r.path),
            FieldDef::new("content", Type::String, |r: &Self| &r.content, Self::content),
            FieldDef::new("exists", Type::Bool, |r: &Self| &r.exists, Self::exists),
            FieldDef::new("size", Type::Int, |r: &Self| &r.size, Self::size),
        ]
    }

    fn identity(&self, rt: &Runtime) -> Result<String> {
        self.require_path(rt)
    }
}
