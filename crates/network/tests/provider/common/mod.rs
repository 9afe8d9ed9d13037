//! Generated certificates and runtimes over the network provider.
//!
//! - `ca`: self-signed CA `Factgraph Test CA`, no SAN extension
//! - `leaf`: signed by `ca`, serial `01:02:03`, SANs for a host, an IP, an
//!   email address and a URI, server-auth usage, one CRL distribution point

#![allow(dead_code)]

use factgraph_core::RawData;
use factgraph_engine::{Args, MemoryConnection, RecordingStore, Runtime};
use rcgen::{
    BasicConstraints, CertificateParams, CrlDistributionPoint, DistinguishedName, DnType,
    ExtendedKeyUsagePurpose, IsCa, Issuer, KeyPair, KeyUsagePurpose, SanType, SerialNumber,
};
use std::sync::{Arc, Once};

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

pub const LEAF_CN: &str = "leaf.example.test";
pub const CA_CN: &str = "Factgraph Test CA";
pub const ORG: &str = "Factgraph Test";
pub const CRL_URI: &str = "http://crl.example.test/ca.crl";

pub struct Chain {
    pub ca: String,
    pub leaf: String,
}

impl Chain {
    /// Leaf followed by its CA
    pub fn bundle(&self) -> String {
        format!("{}{}", self.leaf, self.ca)
    }
}

fn name(common_name: &str) -> DistinguishedName {
    let mut name = DistinguishedName::new();
    name.push(DnType::CommonName, common_name);
    name.push(DnType::OrganizationName, ORG);
    name.push(DnType::CountryName, "US");
    name
}

pub fn chain() -> Chain {
    let ca_key = KeyPair::generate().unwrap();
    let mut ca_params = CertificateParams::default();
    ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    ca_params.distinguished_name = name(CA_CN);
    ca_params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];
    let ca = ca_params.self_signed(&ca_key).unwrap();
    let issuer = Issuer::new(ca_params, ca_key);

    let key = KeyPair::generate().unwrap();
    let mut params =
        CertificateParams::new(vec!["localhost".to_string(), "127.0.0.1".to_string()]).unwrap();
    params.subject_alt_names.push(SanType::Rfc822Name(
        "ops@example.test".try_into().unwrap(),
    ));
    params.subject_alt_names.push(SanType::URI(
        "https://leaf.example.test/".try_into().unwrap(),
    ));
    params.distinguished_name = name(LEAF_CN);
    params.is_ca = IsCa::NoCa;
    params.serial_number = Some(SerialNumber::from(vec![0x01, 0x02, 0x03]));
    params.not_before = rcgen::date_time_ymd(2024, 1, 1);
    params.not_after = rcgen::date_time_ymd(2099, 1, 1);
    params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyEncipherment,
    ];
    params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
    params.crl_distribution_points = vec![CrlDistributionPoint {
        uris: vec![CRL_URI.to_string()],
    }];
    params.use_authority_key_identifier_extension = true;
    let leaf = params.signed_by(&key, &issuer).unwrap();

    Chain {
        ca: ca.pem(),
        leaf: leaf.pem(),
    }
}

pub fn args(pairs: &[(&str, RawData)]) -> Args {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

pub fn runtime_over(conn: MemoryConnection) -> (Runtime, Arc<MemoryConnection>) {
    init_tracing();
    let conn = Arc::new(conn);
    let rt = Runtime::new(Arc::new(factgraph_network::provider()), conn.clone());
    (rt, conn)
}

pub fn runtime() -> (Runtime, Arc<MemoryConnection>) {
    runtime_over(MemoryConnection::new(1))
}

pub fn replaying(store: RecordingStore) -> Runtime {
    init_tracing();
    Runtime::builder(
        Arc::new(factgraph_network::provider()),
        Arc::new(MemoryConnection::new(1)),
    )
    .recording(Arc::new(store))
    .build()
}
