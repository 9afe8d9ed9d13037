//! `url` resource
//!
//! Built either from a `raw` string or from its parts. `init` normalizes both
//! into the full field set, so the ID is always the canonical string.

use crate::certificate::arg;
use factgraph_core::{Error, RawData, Result, Type, Value};
use factgraph_engine::{
    impl_resource, Args, FieldDef, Init, ResourceSchema, Runtime, Slot, TValue,
};
use std::collections::BTreeMap;
use tracing::debug;
use ::url::Url;

const DEFAULT_SCHEME: &str = "http";

/// A parsed URL
#[derive(Debug, Default)]
pub struct UrlResource {
    id: String,
    scheme: Slot<String>,
    host: Slot<String>,
    port: Slot<i64>,
    path: Slot<String>,
    query: Slot<BTreeMap<String, String>>,
    raw_query: Slot<String>,
    user: Slot<String>,
    password: Slot<String>,
    fragment: Slot<String>,
    string: Slot<String>,
}

impl_resource!(UrlResource);

fn text(args: &Args, key: &str) -> Result<Option<String>> {
    match args.get(key) {
        None => Ok(None),
        Some(raw) => match &raw.value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s.clone())),
            other => Err(Error::invalid_argument(
                key,
                format!("expected string, got {}", other.kind()),
            )),
        },
    }
}

/// Parse `raw`, adding the default scheme when none is given
pub fn parse(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::invalid_argument("raw", "url is empty"));
    }
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("{DEFAULT_SCHEME}://{raw}")
    };
    Url::parse(&candidate).map_err(|e| Error::invalid_argument("raw", format!("{raw}: {e}")))
}

/// Assemble a URL string from individual parts
fn compose(args: &Args) -> Result<String> {
    let host = text(args, "host")?
        .ok_or_else(|| Error::invalid_argument("host", "either raw or host is required"))?;
    let scheme = text(args, "scheme")?.unwrap_or_else(|| DEFAULT_SCHEME.to_string());

    let mut out = format!("{scheme}://");
    if let Some(user) = text(args, "user")?.filter(|u| !u.is_empty()) {
        out.push_str(&user);
        if let Some(password) = text(args, "password")?.filter(|p| !p.is_empty()) {
            out.push(':');
            out.push_str(&password);
        }
        out.push('@');
    }
    out.push_str(&host);
    match args.get("port").map(|raw| &raw.value) {
        Some(Value::Int(port)) if *port > 0 => out.push_str(&format!(":{port}")),
        Some(Value::Int(_)) | Some(Value::Null) | None => {}
        Some(other) => {
            return Err(Error::invalid_argument(
                "port",
                format!("expected int, got {}", other.kind()),
            ))
        }
    }
    if let Some(path) = text(args, "path")?.filter(|p| !p.is_empty()) {
        if !path.starts_with('/') {
            out.push('/');
        }
        out.push_str(&path);
    }
    if let Some(query) = text(args, "rawQuery")?.filter(|q| !q.is_empty()) {
        out.push('?');
        out.push_str(&query);
    }
    if let Some(fragment) = text(args, "fragment")?.filter(|f| !f.is_empty()) {
        out.push('#');
        out.push_str(&fragment);
    }
    Ok(out)
}

/// Full argument set for a parsed URL
fn url_args(url: &Url) -> Args {
    let query: BTreeMap<String, String> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let port = url.port_or_known_default().map(i64::from).unwrap_or(0);

    let mut args = Args::new();
    args.insert("scheme".into(), RawData::string(url.scheme()));
    args.insert("host".into(), RawData::string(url.host_str().unwrap_or("")));
    args.insert("port".into(), RawData::int(port));
    args.insert("path".into(), RawData::string(url.path()));
    args.insert("query".into(), arg(Type::map(Type::String), query));
    args.insert("rawQuery".into(), RawData::string(url.query().unwrap_or("")));
    args.insert("user".into(), RawData::string(url.username()));
    args.insert(
        "password".into(),
        RawData::string(url.password().unwrap_or("")),
    );
    args.insert(
        "fragment".into(),
        RawData::string(url.fragment().unwrap_or("")),
    );
    args.insert("string".into(), RawData::string(url.as_str()));
    args
}

impl UrlResource {
    /// Scheme, `http` unless given
    pub fn scheme(&self, rt: &Runtime) -> TValue<String> {
        rt.field(self, "scheme", &self.scheme, || Ok(None))
    }

    /// Host name or address
    pub fn host(&self, rt: &Runtime) -> TValue<String> {
        rt.field(self, "host", &self.host, || Ok(None))
    }

    /// Port, defaulted from the scheme; 0 when unknown
    pub fn port(&self, rt: &Runtime) -> TValue<i64> {
        rt.field(self, "port", &self.port, || Ok(None))
    }

    /// Path
    pub fn path(&self, rt: &Runtime) -> TValue<String> {
        rt.field(self, "path", &self.path, || Ok(None))
    }

    /// Decoded query parameters; the last value wins for repeated keys
    pub fn query(&self, rt: &Runtime) -> TValue<BTreeMap<String, String>> {
        rt.field(self, "query", &self.query, || Ok(None))
    }

    /// Query string as written
    pub fn raw_query(&self, rt: &Runtime) -> TValue<String> {
        rt.field(self, "rawQuery", &self.raw_query, || Ok(None))
    }

    /// User name
    pub fn user(&self, rt: &Runtime) -> TValue<String> {
        rt.field(self, "user", &self.user, || Ok(None))
    }

    /// Password
    pub fn password(&self, rt: &Runtime) -> TValue<String> {
        rt.field(self, "password", &self.password, || Ok(None))
    }

    /// Fragment
    pub fn fragment(&self, rt: &Runtime) -> TValue<String> {
        rt.field(self, "fragment", &self.fragment, || Ok(None))
    }

    /// Canonical form
    pub fn string(&self, rt: &Runtime) -> TValue<String> {
        rt.field(self, "string", &self.string, || Ok(None))
    }
}

impl ResourceSchema for UrlResource {
    const NAME: &'static str = "url";

    fn fields() -> Vec<FieldDef<Self>> {
        vec![
            FieldDef::stored("scheme", Type::String, |r: &Self| &r.scheme),
            FieldDef::stored("host", Type::String, |r: &Self| &r.host),
            FieldDef::stored("port", Type::Int, |r: &Self| &r.port),
            FieldDef::stored("path", Type::String, |r: &Self| &r.path),
            FieldDef::stored("query", Type::map(Type::String), |r: &Self| &r.query),
            FieldDef::stored("rawQuery", Type::String, |r: &Self| &r.raw_query),
            FieldDef::stored("user", Type::String, |r: &Self| &r.user),
            FieldDef::stored("password", Type::String, |r: &Self| &r.password),
            FieldDef::stored("fragment", Type::String, |r: &Self| &r.fragment),
            FieldDef::stored("string", Type::String, |r: &Self| &r.string),
        ]
    }

    fn identity(&self, rt: &Runtime) -> Result<String> {
        self.string(rt)
            .into_result()?
            .ok_or_else(|| Error::identity(Self::NAME, "url has no canonical string"))
    }

    fn init(_rt: &Runtime, mut args: Args) -> Result<Init> {
        let raw = match text(&args, "raw")? {
            Some(raw) => raw,
            None => compose(&args)?,
        };
        args.remove("raw");
        let url = parse(&raw)?;
        debug!(target: "factgraph::network", url = url.as_str(), "Parsed url");
        Ok(Init::Continue(url_args(&url)))
    }
}
