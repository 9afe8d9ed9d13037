//! PEM splitting, re-encoding, and certificate digests

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use factgraph_core::{Error, Result};
use rustls_pki_types::pem::PemObject;
use rustls_pki_types::CertificateDer;
use sha2::{Digest, Sha256, Sha512};
use std::collections::BTreeMap;

const PEM_LINE: usize = 64;

/// Split PEM text into DER certificates, in order.
///
/// Non-certificate blocks (keys, CRLs) are skipped. Text without a single
/// certificate is an error.
pub fn parse_certs(pem: &str) -> Result<Vec<CertificateDer<'static>>> {
    let certs = CertificateDer::pem_slice_iter(pem.as_bytes())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| invalid_pem(e.to_string()))?;
    if certs.is_empty() {
        return Err(invalid_pem("no certificate found"));
    }
    Ok(certs)
}

/// Encode one DER certificate as a PEM block
pub fn encode_cert(der: &[u8]) -> String {
    let body = STANDARD.encode(der);
    let mut out = String::with_capacity(body.len() + body.len() / PEM_LINE + 64);
    out.push_str("-----BEGIN CERTIFICATE-----\n");
    for line in body.as_bytes().chunks(PEM_LINE) {
        // base64 output is ASCII
        out.push_str(&String::from_utf8_lossy(line));
        out.push('\n');
    }
    out.push_str("-----END CERTIFICATE-----\n");
    out
}

/// `sha256` and `sha512` digests of a DER certificate, lowercase hex
pub fn fingerprints(der: &[u8]) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    out.insert("sha256".to_string(), sha256_hex(der));
    out.insert("sha512".to_string(), hex::encode(Sha512::digest(der)));
    out
}

/// Lowercase hex SHA-256 of `data`
pub fn sha256_hex(data: impl AsRef<[u8]>) -> String {
    hex::encode(Sha256::digest(data.as_ref()))
}

/// Uppercase, colon-separated hex (`0A:1B:2C`)
pub fn human_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(":")
}

pub(crate) fn invalid_pem(reason: impl std::fmt::Display) -> Error {
    Error::invalid_argument("pem", format!("certificate has invalid pem data: {reason}"))
}
