//! Full sessions: connect, construct, read fields, store, disconnect.

use crate::common::*;
use factgraph::wire::{ops, ResourceData, StoreReq};
use factgraph::{GraphConfig, RawData};
use serde_json::json;

#[test]
fn test_certificate_chain_over_the_wire() {
    let client = Client::new(service(&GraphConfig::default(), &[]));
    let conn = client.connect();
    let bundle = format!("{}{}", self_signed("a.example.test"), self_signed("b.example.test"));

    let id = client.construct(
        conn,
        "parse.certificates",
        args(&[("content", RawData::string(bundle))]),
    );
    assert!(id.starts_with("certificates:in-memory://"));

    let list = client
        .field(conn, "parse.certificates", &id, "list")
        .into_result()
        .unwrap();
    let refs: Vec<_> = list
        .value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_resource().unwrap().clone())
        .collect();
    assert_eq!(refs.len(), 2);

    for cert in &refs {
        assert_eq!(cert.name, "certificate");
        let fingerprints = client
            .field(conn, "certificate", &cert.id, "fingerprints")
            .into_result()
            .unwrap();
        let sha256 = fingerprints.value.as_map().unwrap()["sha256"].clone();
        assert_eq!(cert.id, format!("certificate:{}", sha256.as_str().unwrap()));

        let serial = client
            .field(conn, "certificate", &cert.id, "serial")
            .into_result()
            .unwrap();
        assert!(!serial.value.as_str().unwrap().is_empty());
    }

    let subject = client
        .field(conn, "certificate", &refs[1].id, "subject")
        .into_result()
        .unwrap();
    let subject = subject.value.as_resource().unwrap().clone();
    let names = client
        .field(conn, "pkix.name", &subject.id, "names")
        .into_result()
        .unwrap();
    assert!(names.value.as_map().is_some());
}

#[test]
fn test_field_faults_travel_in_the_answer() {
    let client = Client::new(service(&GraphConfig::default(), &[]));
    let conn = client.connect();
    let id = client.construct(
        conn,
        "certificates",
        args(&[("pem", RawData::string(self_signed("c.example.test")))]),
    );
    let list = client.field(conn, "certificates", &id, "list").into_result().unwrap();
    let cert = list.value.as_array().unwrap()[0].as_resource().unwrap().clone();

    let fault = client
        .field(conn, "certificate", &cert.id, "isRevoked")
        .into_result()
        .unwrap_err();
    assert_eq!(fault.resource, "certificate");
    assert_eq!(fault.field, "isRevoked");
    assert!(fault.message.contains("unknown revocation status"));

    let unknown = client.field(conn, "certificate", &cert.id, "colour");
    assert!(unknown.is_error());
}

#[test]
fn test_certificates_from_target_file() {
    let pem = self_signed("d.example.test");
    let client = Client::new(service(
        &GraphConfig::default(),
        &[("/etc/ssl/cert.pem", pem.as_str())],
    ));
    let conn = client.connect();

    let id = client.construct(
        conn,
        "parse.certificates",
        args(&[("path", RawData::string("/etc/ssl/cert.pem"))]),
    );
    assert_eq!(id, "certificates:/etc/ssl/cert.pem");

    let content = client
        .field(conn, "parse.certificates", &id, "content")
        .into_result()
        .unwrap();
    assert_eq!(content.value.as_str(), Some(pem.as_str()));

    let file = client
        .field(conn, "file", "/etc/ssl/cert.pem", "size")
        .into_result()
        .unwrap();
    assert_eq!(file.value.as_int(), Some(pem.len() as i64));
}

#[test]
fn test_url_over_the_wire() {
    let client = Client::new(service(&GraphConfig::default(), &[]));
    let conn = client.connect();

    let id = client.construct(
        conn,
        "url",
        args(&[("raw", RawData::string("example.com:8080/status?full=1"))]),
    );
    assert_eq!(id, "http://example.com:8080/status?full=1");

    let port = client.field(conn, "url", &id, "port").into_result().unwrap();
    assert_eq!(port.value.as_int(), Some(8080));
    let query = client.field(conn, "url", &id, "query").into_result().unwrap();
    assert_eq!(
        query.value.as_map().unwrap()["full"].as_str(),
        Some("1")
    );
}

#[test]
fn test_stored_resources_answer_reads() {
    let client = Client::new(service(&GraphConfig::default(), &[]));
    let conn = client.connect();

    let stored = client.call(
        ops::STORE_DATA,
        StoreReq {
            connection: conn,
            resources: vec![ResourceData {
                name: "file".to_string(),
                id: "/etc/hosts".to_string(),
                fields: args(&[
                    ("path", RawData::string("/etc/hosts")),
                    ("content", RawData::string("127.0.0.1 localhost\n")),
                ]),
            }],
        },
    );
    assert!(stored.ok, "{:?}", stored.error);

    let content = client
        .field(conn, "file", "/etc/hosts", "content")
        .into_result()
        .unwrap();
    assert_eq!(content.value.as_str(), Some("127.0.0.1 localhost\n"));

    // not stored and not on the target
    assert!(client.field(conn, "file", "/etc/hosts", "size").is_error());
}

#[test]
fn test_disconnect_ends_the_session() {
    let client = Client::new(service(&GraphConfig::default(), &[]));
    let conn = client.connect();
    assert_eq!(client.service().runtime_count(), 1);

    let closed = client.call(ops::DISCONNECT, json!({ "connection": conn }));
    assert!(closed.ok);
    assert_eq!(client.service().runtime_count(), 0);

    let gone = client.call(
        ops::GET_DATA,
        factgraph::wire::DataReq::field(conn, "file", "/etc/hosts", "content"),
    );
    assert!(!gone.ok);
    assert_eq!(gone.error.unwrap().code, "NotFound");
}
