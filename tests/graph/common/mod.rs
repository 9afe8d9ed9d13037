//! Shared helpers for the graph suite.
//!
//! Requests go through the text encoding in both directions, the way a
//! client on the other side of a transport would see them.

#![allow(dead_code)]

use factgraph::wire::{
    decode_request, decode_response, encode_request, encode_response, ops, ConnectReq,
    ConnectRes, DataReq, DataRes, Request, Response,
};
use factgraph::{Connection, GraphConfig, MemoryConnection, RawData, Service};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Once};

static TRACING: Once = Once::new();

/// Route log output to the test harness
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

/// Client side of a session with a service
pub struct Client {
    service: Service,
    next_id: AtomicU64,
}

impl Client {
    pub fn new(service: Service) -> Self {
        init_tracing();
        Client {
            service,
            next_id: AtomicU64::new(1),
        }
    }

    /// Encode, hand to the service, and decode the answer
    pub fn call(&self, op: &str, params: impl Serialize) -> Response {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        let text = encode_request(&Request::new(id.as_str(), op, params).unwrap());
        let request = decode_request(&text).unwrap();
        let response = self.service.handle(&request);
        let decoded = decode_response(&encode_response(&response)).unwrap();
        assert_eq!(decoded.id, id);
        decoded
    }

    pub fn connect(&self) -> u32 {
        let response = self.call(ops::CONNECT, ConnectReq::default());
        assert!(response.ok, "{:?}", response.error);
        response.result::<ConnectRes>().unwrap().id
    }

    /// Construct a resource and return its ID
    pub fn construct(&self, connection: u32, resource: &str, args: BTreeMap<String, RawData>) -> String {
        let response = self.call(ops::GET_DATA, DataReq::construct(connection, resource, args));
        assert!(response.ok, "{:?}", response.error);
        let raw = response.result::<DataRes>().unwrap().into_result().unwrap();
        raw.value.as_resource().unwrap().id.clone()
    }

    pub fn field(&self, connection: u32, resource: &str, id: &str, field: &str) -> DataRes {
        let response = self.call(ops::GET_DATA, DataReq::field(connection, resource, id, field));
        assert!(response.ok, "{:?}", response.error);
        response.result::<DataRes>().unwrap()
    }

    pub fn service(&self) -> &Service {
        &self.service
    }
}

/// Network service whose connections serve `files` from memory
pub fn service(config: &GraphConfig, files: &[(&str, &str)]) -> Service {
    let files: Vec<(String, String)> = files
        .iter()
        .map(|(p, c)| (p.to_string(), c.to_string()))
        .collect();
    factgraph::network_service(config)
        .unwrap()
        .with_connector(move |_req, id| {
            let conn = files
                .iter()
                .fold(MemoryConnection::new(id), |conn, (path, content)| {
                    conn.with_file(path.as_str(), content.as_str())
                });
            Ok(Arc::new(conn) as Arc<dyn Connection>)
        })
}

pub fn args(pairs: &[(&str, RawData)]) -> BTreeMap<String, RawData> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

pub fn self_signed(host: &str) -> String {
    rcgen::generate_simple_self_signed(vec![host.to_string()])
        .unwrap()
        .cert
        .pem()
}
