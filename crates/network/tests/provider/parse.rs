//! `parse.certificates` and `file`: certificates from the target or inline.

use crate::common::*;
use factgraph_core::{Error, RawData, ResourceRef, Type, Value};
use factgraph_engine::{LocalConnection, MemoryConnection, RecordingStore, Resource, Runtime};
use factgraph_network::{File, ParseCertificates};
use std::sync::Arc;

const BUNDLE_PATH: &str = "/etc/ssl/certs/bundle.pem";

#[test]
fn test_certificates_from_a_file() {
    let chain = chain();
    let (rt, conn) =
        runtime_over(MemoryConnection::new(1).with_file(BUNDLE_PATH, chain.bundle()));

    let parsed = rt
        .new_typed::<ParseCertificates>(args(&[("path", RawData::string(BUNDLE_PATH))]))
        .unwrap();
    assert_eq!(parsed.id(), format!("certificates:{BUNDLE_PATH}"));

    let list = parsed.list(&rt).data.unwrap();
    assert_eq!(list.len(), 2);
    assert!(list.iter().all(|r| r.name == "certificate"));
    assert_eq!(conn.access_log(), vec![format!("read_file {BUNDLE_PATH}")]);

    // cached
    parsed.list(&rt);
    assert_eq!(conn.accesses(), 1);
}

#[test]
fn test_file_resource_is_shared() {
    let chain = chain();
    let (rt, _conn) =
        runtime_over(MemoryConnection::new(1).with_file(BUNDLE_PATH, chain.leaf.clone()));

    let parsed = rt
        .new_typed::<ParseCertificates>(args(&[("path", RawData::string(BUNDLE_PATH))]))
        .unwrap();
    let file_ref = parsed.file(&rt).data.unwrap();
    let file = rt.resolve::<File>(&file_ref).unwrap();

    assert_eq!(file.id(), BUNDLE_PATH);
    assert_eq!(file.exists(&rt).data, Some(true));
    assert_eq!(file.size(&rt).data, Some(chain.leaf.len() as i64));
    assert_eq!(parsed.content(&rt).data, Some(chain.leaf));
}

#[test]
fn test_inline_content_uses_virtual_file() {
    let chain = chain();
    let (rt, conn) = runtime();

    let parsed = rt
        .new_typed::<ParseCertificates>(args(&[("content", RawData::string(chain.bundle()))]))
        .unwrap();
    let path = parsed.path(&rt).data.unwrap();
    assert!(path.starts_with("in-memory://"));
    assert_eq!(parsed.id(), format!("certificates:{path}"));

    let file = rt.resolve::<File>(&parsed.file(&rt).data.unwrap()).unwrap();
    assert_eq!(file.exists(&rt).data, Some(true));
    assert_eq!(file.size(&rt).data, Some(chain.bundle().len() as i64));

    assert_eq!(parsed.list(&rt).data.unwrap().len(), 2);
    assert_eq!(conn.accesses(), 0);
}

#[test]
fn test_same_inline_content_is_one_resource() {
    let chain = chain();
    let (rt, _conn) = runtime();
    let content = args(&[("content", RawData::string(chain.leaf.clone()))]);

    let a = rt.new_resource("parse.certificates", content.clone()).unwrap();
    let b = rt.new_resource("parse.certificates", content).unwrap();
    assert_eq!(a.id(), b.id());
}

#[test]
fn test_missing_arguments_are_rejected() {
    let (rt, _conn) = runtime();
    let err = rt.new_resource("parse.certificates", args(&[])).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }));
    assert!(err.to_string().contains("missing 'path' or 'content'"));

    let err = rt
        .new_resource("parse.certificates", args(&[("content", RawData::int(3))]))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { ref name, .. } if name == "content"));
}

#[test]
fn test_missing_file() {
    let (rt, _conn) = runtime();
    let parsed = rt
        .new_typed::<ParseCertificates>(args(&[("path", RawData::string("/nope.pem"))]))
        .unwrap();
    let file = rt.resolve::<File>(&parsed.file(&rt).data.unwrap()).unwrap();

    assert_eq!(file.exists(&rt).data, Some(false));
    assert!(file.size(&rt).is_error());
    let list = rt.get_data(&*parsed, "list");
    assert!(list.is_error());
}

#[test]
fn test_list_is_labelled_as_certificates_and_survives_json() {
    let chain = chain();
    let (rt, _conn) =
        runtime_over(MemoryConnection::new(1).with_file(BUNDLE_PATH, chain.bundle()));
    let parsed = rt
        .new_typed::<ParseCertificates>(args(&[("path", RawData::string(BUNDLE_PATH))]))
        .unwrap();

    let list = rt.get_data(&*parsed, "list").into_result().unwrap();
    assert_eq!(list.ty, Type::array(Type::resource("certificate")));
    assert_eq!(list.ty.to_string(), "[]certificate");

    let text = serde_json::to_string(&list).unwrap();
    let decoded: RawData = serde_json::from_str(&text).unwrap();
    assert_eq!(decoded, list);
}

#[test]
fn test_recorded_list_is_replayed() {
    let recorded = RawData::new(
        Type::array(Type::resource("certificate")),
        Value::Array(vec![Value::Resource(ResourceRef::new(
            "certificate",
            "certificate:abc",
        ))]),
    );
    let id = format!("certificates:{BUNDLE_PATH}");
    let rt = replaying(RecordingStore::new().with_field(
        "parse.certificates",
        id.as_str(),
        "list",
        recorded,
    ));

    let parsed = rt
        .new_typed::<ParseCertificates>(args(&[("path", RawData::string(BUNDLE_PATH))]))
        .unwrap();
    // the file does not exist on this connection, so a live read would fail
    let list = parsed.list(&rt).data.unwrap();
    assert_eq!(list, vec![ResourceRef::new("certificate", "certificate:abc")]);
}

#[test]
fn test_certificates_from_a_local_file() {
    let chain = chain();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bundle.pem");
    std::fs::write(&path, chain.bundle()).unwrap();
    let path = path.to_string_lossy().into_owned();

    let rt = Runtime::new(
        Arc::new(factgraph_network::provider()),
        Arc::new(LocalConnection::new(1)),
    );
    let parsed = rt
        .new_typed::<ParseCertificates>(args(&[("path", RawData::string(path.as_str()))]))
        .unwrap();

    let file = rt.resolve::<File>(&parsed.file(&rt).data.unwrap()).unwrap();
    assert_eq!(file.exists(&rt).data, Some(true));
    assert_eq!(file.size(&rt).data, Some(chain.bundle().len() as i64));
    assert_eq!(parsed.list(&rt).data.unwrap().len(), 2);
}
