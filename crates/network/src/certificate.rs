//! `certificates`, `certificate`, and the `pkix.*` resources
//!
//! A `certificate` is built from one PEM block. Its X.509 fields all come
//! from a single parse of that block: the first read of any of them runs the
//! `parsed` compute group, which fills every member slot at once and keeps
//! the structured parts (names, extensions) for the resource-valued fields.
//!
//! IDs:
//! - `certificates`: SHA-256 of the PEM text
//! - `certificate`: `certificate:<sha256 fingerprint>`
//! - `pkix.name`: `<fingerprint>:subject` / `<fingerprint>:issuer`
//! - `pkix.extension`: `<fingerprint>:<oid>`
//! - `pkix.sanExtension`: ID of its extension

use crate::pem;
use chrono::{DateTime, Duration, Utc};
use factgraph_core::{Error, RawData, ResourceRef, Result, Type};
use factgraph_engine::{
    impl_resource, Args, ComputeGroup, FieldDef, FieldValue, Resource, ResourceSchema, Runtime,
    Slot, TValue,
};
use std::collections::BTreeMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::OnceLock;
use tracing::{debug, warn};
use x509_parser::extensions::{DistributionPointName, GeneralName, ParsedExtension};
use x509_parser::objects::{oid2sn, oid_registry};
use x509_parser::prelude::{FromDer, X509Certificate, X509Extension, X509Name};

const OID_SUBJECT_KEY_ID: &str = "2.5.29.14";
const OID_SUBJECT_ALT_NAME: &str = "2.5.29.17";
const OID_ACCESS_OCSP: &str = "1.3.6.1.5.5.7.48.1";
const OID_ACCESS_CA_ISSUERS: &str = "1.3.6.1.5.5.7.48.2";

/// Build a construction argument from a typed value
pub(crate) fn arg<T: FieldValue>(ty: Type, value: T) -> RawData {
    RawData::new(ty, value.into_value())
}

fn strings(items: Vec<String>) -> RawData {
    arg(Type::array(Type::String), items)
}

// ============================================================================
// certificates
// ============================================================================

/// All certificates of a PEM bundle
#[derive(Debug, Default)]
pub struct Certificates {
    id: String,
    pem: Slot<String>,
    list: Slot<Vec<ResourceRef>>,
}

impl_resource!(Certificates);

impl Certificates {
    /// PEM text, as given
    pub fn pem(&self, rt: &Runtime) -> TValue<String> {
        rt.field(self, "pem", &self.pem, || Ok(None))
    }

    /// One `certificate` per PEM block, in order
    pub fn list(&self, rt: &Runtime) -> TValue<Vec<ResourceRef>> {
        rt.field(self, "list", &self.list, || {
            let Some(text) = self.pem(rt).into_result()? else {
                return Ok(None);
            };
            let mut list = Vec::new();
            for der in pem::parse_certs(&text)? {
                let cert = rt.create_typed::<Certificate>(Certificate::args(der.as_ref()))?;
                list.push(cert.to_ref());
            }
            debug!(target: "factgraph::network", count = list.len(), "Certificates listed");
            Ok(Some(list))
        })
    }
}

impl ResourceSchema for Certificates {
    const NAME: &'static str = "certificates";

    fn fields() -> Vec<FieldDef<Self>> {
        vec![
            FieldDef::stored("pem", Type::String, |r: &Self| &r.pem),
            FieldDef::new(
                "list",
                Type::array(Type::resource(Certificate::NAME)),
                |r: &Self| &r.list,
                Self::list,
            ),
        ]
    }

    fn identity(&self, rt: &Runtime) -> Result<String> {
        let pem = self
            .pem(rt)
            .into_result()?
            .ok_or_else(|| Error::invalid_argument("pem", "required"))?;
        Ok(pem::sha256_hex(pem))
    }
}

// ============================================================================
// certificate
// ============================================================================

/// One X.509 certificate
#[derive(Debug, Default)]
pub struct Certificate {
    id: String,
    pem: Slot<String>,
    fingerprints: Slot<BTreeMap<String, String>>,
    serial: Slot<String>,
    subject_key_id: Slot<String>,
    authority_key_id: Slot<String>,
    version: Slot<i64>,
    is_ca: Slot<bool>,
    not_before: Slot<DateTime<Utc>>,
    not_after: Slot<DateTime<Utc>>,
    expires_in: Slot<Duration>,
    signing_algorithm: Slot<String>,
    signature: Slot<String>,
    crl_distribution_points: Slot<Vec<String>>,
    ocsp_server: Slot<Vec<String>>,
    issuing_certificate_url: Slot<Vec<String>>,
    subject: Slot<ResourceRef>,
    issuer: Slot<ResourceRef>,
    extensions: Slot<Vec<ResourceRef>>,
    key_usage: Slot<Vec<String>>,
    extended_key_usage: Slot<Vec<String>>,
    san_extension: Slot<ResourceRef>,
    is_revoked: Slot<bool>,
    revoked_at: Slot<DateTime<Utc>>,
    is_verified: Slot<bool>,
    parsed: ComputeGroup,
    details: OnceLock<CertDetails>,
}

impl_resource!(Certificate);

/// Parts of a parsed certificate that back resource-valued fields
#[derive(Debug, Clone)]
struct CertDetails {
    fingerprint: String,
    subject: NameDetails,
    issuer: NameDetails,
    extensions: Vec<ExtensionDetails>,
    key_usage: Vec<String>,
    extended_key_usage: Vec<String>,
    san: Option<SanDetails>,
}

#[derive(Debug, Clone, Default)]
struct NameDetails {
    dn: String,
    serial_number: String,
    common_name: String,
    country: Vec<String>,
    organization: Vec<String>,
    organizational_unit: Vec<String>,
    locality: Vec<String>,
    province: Vec<String>,
    street_address: Vec<String>,
    postal_code: Vec<String>,
    names: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
struct ExtensionDetails {
    oid: String,
    critical: bool,
    value: String,
}

#[derive(Debug, Clone)]
struct SanDetails {
    extension: ExtensionDetails,
    dns_names: Vec<String>,
    email_addresses: Vec<String>,
    ip_addresses: Vec<String>,
    uris: Vec<String>,
}

impl Certificate {
    /// Construction arguments for one DER certificate.
    ///
    /// Fingerprints are passed along so the ID is known without parsing.
    pub fn args(der: &[u8]) -> Args {
        let mut args = Args::new();
        args.insert("pem".into(), RawData::string(pem::encode_cert(der)));
        args.insert(
            "fingerprints".into(),
            arg(Type::map(Type::String), pem::fingerprints(der)),
        );
        args
    }

    /// How often the PEM was parsed (0 or 1)
    pub fn parse_runs(&self) -> usize {
        self.parsed.runs()
    }

    /// PEM text
    pub fn pem(&self, rt: &Runtime) -> TValue<String> {
        rt.field(self, "pem", &self.pem, || Ok(None))
    }

    /// Digests of the DER encoding, keyed by algorithm
    pub fn fingerprints(&self, rt: &Runtime) -> TValue<BTreeMap<String, String>> {
        self.from_parse(rt, "fingerprints", &self.fingerprints)
    }

    /// Serial number
    pub fn serial(&self, rt: &Runtime) -> TValue<String> {
        self.from_parse(rt, "serial", &self.serial)
    }

    /// Subject key identifier
    pub fn subject_key_id(&self, rt: &Runtime) -> TValue<String> {
        self.from_parse(rt, "subjectKeyID", &self.subject_key_id)
    }

    /// Authority key identifier
    pub fn authority_key_id(&self, rt: &Runtime) -> TValue<String> {
        self.from_parse(rt, "authorityKeyID", &self.authority_key_id)
    }

    /// X.509 version (1-3)
    pub fn version(&self, rt: &Runtime) -> TValue<i64> {
        self.from_parse(rt, "version", &self.version)
    }

    /// Whether basic constraints mark this a CA
    pub fn is_ca(&self, rt: &Runtime) -> TValue<bool> {
        self.from_parse(rt, "isCA", &self.is_ca)
    }

    /// Start of validity
    pub fn not_before(&self, rt: &Runtime) -> TValue<DateTime<Utc>> {
        self.from_parse(rt, "notBefore", &self.not_before)
    }

    /// End of validity
    pub fn not_after(&self, rt: &Runtime) -> TValue<DateTime<Utc>> {
        self.from_parse(rt, "notAfter", &self.not_after)
    }

    /// Time left until `notAfter`, negative once expired
    pub fn expires_in(&self, rt: &Runtime) -> TValue<Duration> {
        self.from_parse(rt, "expiresIn", &self.expires_in)
    }

    /// Signature algorithm name
    pub fn signing_algorithm(&self, rt: &Runtime) -> TValue<String> {
        self.from_parse(rt, "signingAlgorithm", &self.signing_algorithm)
    }

    /// Signature, lowercase hex
    pub fn signature(&self, rt: &Runtime) -> TValue<String> {
        self.from_parse(rt, "signature", &self.signature)
    }

    /// CRL distribution point URIs
    pub fn crl_distribution_points(&self, rt: &Runtime) -> TValue<Vec<String>> {
        self.from_parse(rt, "crlDistributionPoints", &self.crl_distribution_points)
    }

    /// OCSP responder URIs
    pub fn ocsp_server(&self, rt: &Runtime) -> TValue<Vec<String>> {
        self.from_parse(rt, "ocspServer", &self.ocsp_server)
    }

    /// Issuer certificate URIs
    pub fn issuing_certificate_url(&self, rt: &Runtime) -> TValue<Vec<String>> {
        self.from_parse(rt, "issuingCertificateUrl", &self.issuing_certificate_url)
    }

    /// Subject name
    pub fn subject(&self, rt: &Runtime) -> TValue<ResourceRef> {
        rt.field(self, "subject", &self.subject, || {
            let details = self.load(rt)?;
            let name = PkixName::create(
                rt,
                &details.subject,
                format!("{}:subject", details.fingerprint),
            )?;
            Ok(Some(name))
        })
    }

    /// Issuer name
    pub fn issuer(&self, rt: &Runtime) -> TValue<ResourceRef> {
        rt.field(self, "issuer", &self.issuer, || {
            let details = self.load(rt)?;
            let name = PkixName::create(
                rt,
                &details.issuer,
                format!("{}:issuer", details.fingerprint),
            )?;
            Ok(Some(name))
        })
    }

    /// Every extension, in certificate order
    pub fn extensions(&self, rt: &Runtime) -> TValue<Vec<ResourceRef>> {
        rt.field(self, "extensions", &self.extensions, || {
            let details = self.load(rt)?;
            details
                .extensions
                .iter()
                .map(|ext| PkixExtension::create(rt, ext, &details.fingerprint))
                .collect::<Result<Vec<_>>>()
                .map(Some)
        })
    }

    /// Key usage names
    pub fn key_usage(&self, rt: &Runtime) -> TValue<Vec<String>> {
        rt.field(self, "keyUsage", &self.key_usage, || {
            Ok(Some(self.load(rt)?.key_usage.clone()))
        })
    }

    /// Extended key usage names; unnamed purposes appear as their OID
    pub fn extended_key_usage(&self, rt: &Runtime) -> TValue<Vec<String>> {
        rt.field(self, "extendedKeyUsage", &self.extended_key_usage, || {
            Ok(Some(self.load(rt)?.extended_key_usage.clone()))
        })
    }

    /// Subject alternative names; null when the extension is absent
    pub fn san_extension(&self, rt: &Runtime) -> TValue<ResourceRef> {
        rt.field(self, "sanExtension", &self.san_extension, || {
            let details = self.load(rt)?;
            match &details.san {
                Some(san) => PkixSanExtension::create(rt, san, &details.fingerprint).map(Some),
                None => Ok(None),
            }
        })
    }

    /// Revocation is not checked; always an error
    pub fn is_revoked(&self, rt: &Runtime) -> TValue<bool> {
        rt.field(self, "isRevoked", &self.is_revoked, || {
            Err(Error::compute(Self::NAME, "isRevoked", "unknown revocation status"))
        })
    }

    /// Always null
    pub fn revoked_at(&self, rt: &Runtime) -> TValue<DateTime<Utc>> {
        rt.field(self, "revokedAt", &self.revoked_at, || Ok(None))
    }

    /// Chain verification is not performed; always false
    pub fn is_verified(&self, rt: &Runtime) -> TValue<bool> {
        rt.field(self, "isVerified", &self.is_verified, || Ok(Some(false)))
    }

    fn from_parse<T: FieldValue>(&self, rt: &Runtime, field: &str, slot: &Slot<T>) -> TValue<T> {
        rt.field(self, field, slot, || self.load(rt).map(|_| None))
    }

    /// Parse the PEM once and fill every parse-backed slot
    fn load(&self, rt: &Runtime) -> Result<&CertDetails> {
        self.parsed.run(|| {
            let text = self
                .pem(rt)
                .into_result()?
                .ok_or_else(|| Error::invalid_argument("pem", "certificate is missing pem data"))?;
            let certs = pem::parse_certs(&text)?;
            if certs.len() > 1 {
                warn!(
                    target: "factgraph::network",
                    count = certs.len(),
                    "PEM holds more than one certificate, ignoring the rest"
                );
            }
            let der = certs
                .first()
                .ok_or_else(|| pem::invalid_pem("no certificate found"))?;
            let (_, cert) =
                X509Certificate::from_der(der.as_ref()).map_err(pem::invalid_pem)?;

            self.fill(&cert, der.as_ref())?;
            let _ = self.details.set(CertDetails::new(&cert, der.as_ref()));
            Ok(())
        })?;
        self.details
            .get()
            .ok_or_else(|| Error::compute(Self::NAME, "pem", "certificate details unavailable"))
    }

    fn fill(&self, cert: &X509Certificate<'_>, der: &[u8]) -> Result<()> {
        let validity = cert.validity();
        let not_before = timestamp(validity.not_before.timestamp())?;
        let not_after = timestamp(validity.not_after.timestamp())?;

        let mut subject_key_id = String::new();
        let mut authority_key_id = String::new();
        let mut crl = Vec::new();
        let mut ocsp = Vec::new();
        let mut issuing = Vec::new();
        for ext in cert.extensions() {
            match ext.parsed_extension() {
                ParsedExtension::SubjectKeyIdentifier(kid) => {
                    subject_key_id = pem::human_hex(kid.0);
                }
                ParsedExtension::AuthorityKeyIdentifier(aki) => {
                    if let Some(kid) = &aki.key_identifier {
                        authority_key_id = pem::human_hex(kid.0);
                    }
                }
                ParsedExtension::CRLDistributionPoints(points) => {
                    for point in &points.points {
                        if let Some(DistributionPointName::FullName(names)) =
                            &point.distribution_point
                        {
                            crl.extend(names.iter().filter_map(uri));
                        }
                    }
                }
                ParsedExtension::AuthorityInfoAccess(aia) => {
                    for desc in &aia.accessdescs {
                        let Some(location) = uri(&desc.access_location) else {
                            continue;
                        };
                        match desc.access_method.to_id_string().as_str() {
                            OID_ACCESS_OCSP => ocsp.push(location),
                            OID_ACCESS_CA_ISSUERS => issuing.push(location),
                            _ => {}
                        }
                    }
                }
                _ => {}
            }
        }

        let serial = cert.raw_serial();
        let serial_start = serial.iter().position(|b| *b != 0).unwrap_or(serial.len());
        let algorithm = &cert.signature_algorithm.algorithm;

        self.fingerprints.fill(Some(pem::fingerprints(der)));
        self.serial.fill(Some(pem::human_hex(&serial[serial_start..])));
        self.subject_key_id.fill(Some(subject_key_id));
        self.authority_key_id.fill(Some(authority_key_id));
        self.version.fill(Some(i64::from(cert.version().0) + 1));
        self.is_ca.fill(Some(cert.is_ca()));
        self.not_before.fill(Some(not_before));
        self.not_after.fill(Some(not_after));
        self.expires_in.fill(Some(not_after - Utc::now()));
        self.signing_algorithm.fill(Some(
            oid2sn(algorithm, oid_registry())
                .map(str::to_string)
                .unwrap_or_else(|_| algorithm.to_id_string()),
        ));
        self.signature
            .fill(Some(hex::encode(&*cert.signature_value.data)));
        self.crl_distribution_points.fill(Some(crl));
        self.ocsp_server.fill(Some(ocsp));
        self.issuing_certificate_url.fill(Some(issuing));
        Ok(())
    }
}

impl ResourceSchema for Certificate {
    const NAME: &'static str = "certificate";

    fn fields() -> Vec<FieldDef<Self>> {
        let strings = || Type::array(Type::String);
        vec![
            FieldDef::stored("pem", Type::String, |r: &Self| &r.pem),
            FieldDef::new(
                "fingerprints",
                Type::map(Type::String),
                |r: &Self| &r.fingerprints,
                Self::fingerprints,
            ),
            FieldDef::new("serial", Type::String, |r: &Self| &r.serial, Self::serial),
            FieldDef::new(
                "subjectKeyID",
                Type::String,
                |r: &Self| &r.subject_key_id,
                Self::subject_key_id,
            ),
            FieldDef::new(
                "authorityKeyID",
                Type::String,
                |r: &Self| &r.authority_key_id,
                Self::authority_key_id,
            ),
            FieldDef::new("version", Type::Int, |r: &Self| &r.version, Self::version),
            FieldDef::new("isCA", Type::Bool, |r: &Self| &r.is_ca, Self::is_ca),
            FieldDef::new("notBefore", Type::Time, |r: &Self| &r.not_before, Self::not_before),
            FieldDef::new("notAfter", Type::Time, |r: &Self| &r.not_after, Self::not_after),
            FieldDef::new(
                "expiresIn",
                Type::Duration,
                |r: &Self| &r.expires_in,
                Self::expires_in,
            ),
            FieldDef::new(
                "signingAlgorithm",
                Type::String,
                |r: &Self| &r.signing_algorithm,
                Self::signing_algorithm,
            ),
            FieldDef::new("signature", Type::String, |r: &Self| &r.signature, Self::signature),
            FieldDef::new(
                "crlDistributionPoints",
                strings(),
                |r: &Self| &r.crl_distribution_points,
                Self::crl_distribution_points,
            ),
            FieldDef::new(
                "ocspServer",
                strings(),
                |r: &Self| &r.ocsp_server,
                Self::ocsp_server,
            ),
            FieldDef::new(
                "issuingCertificateUrl",
                strings(),
                |r: &Self| &r.issuing_certificate_url,
                Self::issuing_certificate_url,
            ),
            FieldDef::new(
                "subject",
                Type::resource(PkixName::NAME),
                |r: &Self| &r.subject,
                Self::subject,
            ),
            FieldDef::new(
                "issuer",
                Type::resource(PkixName::NAME),
                |r: &Self| &r.issuer,
                Self::issuer,
            ),
            FieldDef::new(
                "extensions",
                Type::array(Type::resource(PkixExtension::NAME)),
                |r: &Self| &r.extensions,
                Self::extensions,
            ),
            FieldDef::new("keyUsage", strings(), |r: &Self| &r.key_usage, Self::key_usage),
            FieldDef::new(
                "extendedKeyUsage",
                strings(),
                |r: &Self| &r.extended_key_usage,
                Self::extended_key_usage,
            ),
            FieldDef::new(
                "sanExtension",
                Type::resource(PkixSanExtension::NAME),
                |r: &Self| &r.san_extension,
                Self::san_extension,
            ),
            FieldDef::new("isRevoked", Type::Bool, |r: &Self| &r.is_revoked, Self::is_revoked),
            FieldDef::new("revokedAt", Type::Time, |r: &Self| &r.revoked_at, Self::revoked_at),
            FieldDef::new(
                "isVerified",
                Type::Bool,
                |r: &Self| &r.is_verified,
                Self::is_verified,
            ),
        ]
    }

    fn identity(&self, rt: &Runtime) -> Result<String> {
        let fingerprints = self
            .fingerprints(rt)
            .into_result()?
            .ok_or_else(|| Error::invalid_argument("fingerprints", "required"))?;
        let sha256 = fingerprints.get("sha256").ok_or_else(|| {
            Error::invalid_argument("fingerprints", "missing sha256 fingerprint")
        })?;
        Ok(format!("certificate:{sha256}"))
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| pem::invalid_pem(format!("validity time {secs} out of range")))
}

fn uri(name: &GeneralName<'_>) -> Option<String> {
    match name {
        GeneralName::URI(uri) => Some(uri.to_string()),
        _ => None,
    }
}

fn ip_address(bytes: &[u8]) -> String {
    if let Ok(v4) = <[u8; 4]>::try_from(bytes) {
        return Ipv4Addr::from(v4).to_string();
    }
    if let Ok(v6) = <[u8; 16]>::try_from(bytes) {
        return Ipv6Addr::from(v6).to_string();
    }
    hex::encode(bytes)
}

fn general_name(name: &GeneralName<'_>) -> String {
    match name {
        GeneralName::DNSName(s) | GeneralName::RFC822Name(s) | GeneralName::URI(s) => {
            s.to_string()
        }
        GeneralName::IPAddress(bytes) => ip_address(bytes),
        GeneralName::DirectoryName(dn) => dn.to_string(),
        other => format!("{other:?}"),
    }
}

impl CertDetails {
    fn new(cert: &X509Certificate<'_>, der: &[u8]) -> Self {
        let mut key_usage = Vec::new();
        let mut extended_key_usage = Vec::new();
        let mut san = None;
        let mut extensions = Vec::new();

        for ext in cert.extensions() {
            let details = ExtensionDetails::new(ext);
            match ext.parsed_extension() {
                ParsedExtension::KeyUsage(ku) => {
                    let flags = [
                        (ku.digital_signature(), "DigitalSignature"),
                        (ku.non_repudiation(), "ContentCommitment"),
                        (ku.key_encipherment(), "KeyEncipherment"),
                        (ku.data_encipherment(), "DataEncipherment"),
                        (ku.key_agreement(), "KeyAgreement"),
                        (ku.key_cert_sign(), "CertificateSign"),
                        (ku.crl_sign(), "CRLSign"),
                        (ku.encipher_only(), "EncipherOnly"),
                        (ku.decipher_only(), "DecipherOnly"),
                    ];
                    key_usage = flags
                        .iter()
                        .filter(|(set, _)| *set)
                        .map(|(_, name)| name.to_string())
                        .collect();
                }
                ParsedExtension::ExtendedKeyUsage(eku) => {
                    let flags = [
                        (eku.any, "Any"),
                        (eku.server_auth, "ServerAuth"),
                        (eku.client_auth, "ClientAuth"),
                        (eku.code_signing, "CodeSigning"),
                        (eku.email_protection, "EmailProtection"),
                        (eku.time_stamping, "TimeStamping"),
                        (eku.ocsp_signing, "OCSPSigning"),
                    ];
                    extended_key_usage = flags
                        .iter()
                        .filter(|(set, _)| *set)
                        .map(|(_, name)| name.to_string())
                        .collect();
                    extended_key_usage.extend(eku.other.iter().map(|oid| oid.to_id_string()));
                }
                ParsedExtension::SubjectAlternativeName(names) => {
                    let mut entry = SanDetails {
                        extension: details.clone(),
                        dns_names: Vec::new(),
                        email_addresses: Vec::new(),
                        ip_addresses: Vec::new(),
                        uris: Vec::new(),
                    };
                    for name in &names.general_names {
                        match name {
                            GeneralName::DNSName(s) => entry.dns_names.push(s.to_string()),
                            GeneralName::RFC822Name(s) => {
                                entry.email_addresses.push(s.to_string())
                            }
                            GeneralName::URI(s) => entry.uris.push(s.to_string()),
                            GeneralName::IPAddress(bytes) => {
                                entry.ip_addresses.push(ip_address(bytes))
                            }
                            _ => {}
                        }
                    }
                    san = Some(entry);
                }
                _ => {}
            }
            extensions.push(details);
        }

        CertDetails {
            fingerprint: pem::sha256_hex(der),
            subject: NameDetails::new(cert.subject()),
            issuer: NameDetails::new(cert.issuer()),
            extensions,
            key_usage,
            extended_key_usage,
            san,
        }
    }
}

impl NameDetails {
    fn new(name: &X509Name<'_>) -> Self {
        let mut out = NameDetails {
            dn: name.to_string(),
            ..Default::default()
        };
        for attr in name.iter_attributes() {
            let Ok(value) = attr.as_str() else {
                continue;
            };
            let oid = attr.attr_type().to_id_string();
            let value = value.to_string();
            match oid.as_str() {
                "2.5.4.3" => out.common_name = value.clone(),
                "2.5.4.5" => out.serial_number = value.clone(),
                "2.5.4.6" => out.country.push(value.clone()),
                "2.5.4.7" => out.locality.push(value.clone()),
                "2.5.4.8" => out.province.push(value.clone()),
                "2.5.4.9" => out.street_address.push(value.clone()),
                "2.5.4.10" => out.organization.push(value.clone()),
                "2.5.4.11" => out.organizational_unit.push(value.clone()),
                "2.5.4.17" => out.postal_code.push(value.clone()),
                _ => {}
            }
            out.names.insert(oid, value);
        }
        out
    }
}

impl ExtensionDetails {
    fn new(ext: &X509Extension<'_>) -> Self {
        let oid = ext.oid.to_id_string();
        let value = match (oid.as_str(), ext.parsed_extension()) {
            (OID_SUBJECT_KEY_ID, ParsedExtension::SubjectKeyIdentifier(kid)) => {
                pem::human_hex(kid.0)
            }
            (OID_SUBJECT_ALT_NAME, ParsedExtension::SubjectAlternativeName(names)) => names
                .general_names
                .iter()
                .map(general_name)
                .collect::<Vec<_>>()
                .join(" | "),
            _ => String::from_utf8_lossy(ext.value).into_owned(),
        };
        ExtensionDetails {
            oid,
            critical: ext.critical,
            value,
        }
    }
}

// ============================================================================
// pkix.name
// ============================================================================

/// Distinguished name of a certificate subject or issuer
#[derive(Debug, Default)]
pub struct PkixName {
    id: String,
    key: Slot<String>,
    dn: Slot<String>,
    serial_number: Slot<String>,
    common_name: Slot<String>,
    country: Slot<Vec<String>>,
    organization: Slot<Vec<String>>,
    organizational_unit: Slot<Vec<String>>,
    locality: Slot<Vec<String>>,
    province: Slot<Vec<String>>,
    street_address: Slot<Vec<String>>,
    postal_code: Slot<Vec<String>>,
    names: Slot<BTreeMap<String, String>>,
}

impl_resource!(PkixName);

impl PkixName {
    fn create(rt: &Runtime, name: &NameDetails, id: String) -> Result<ResourceRef> {
        let mut args = Args::new();
        args.insert("id".into(), RawData::string(id));
        args.insert("dn".into(), RawData::string(name.dn.clone()));
        args.insert("serialNumber".into(), RawData::string(name.serial_number.clone()));
        args.insert("commonName".into(), RawData::string(name.common_name.clone()));
        args.insert("country".into(), strings(name.country.clone()));
        args.insert("organization".into(), strings(name.organization.clone()));
        args.insert(
            "organizationalUnit".into(),
            strings(name.organizational_unit.clone()),
        );
        args.insert("locality".into(), strings(name.locality.clone()));
        args.insert("province".into(), strings(name.province.clone()));
        args.insert("streetAddress".into(), strings(name.street_address.clone()));
        args.insert("postalCode".into(), strings(name.postal_code.clone()));
        args.insert(
            "names".into(),
            arg(Type::map(Type::String), name.names.clone()),
        );
        Ok(rt.create_typed::<Self>(args)?.to_ref())
    }

    /// Identifier, `<fingerprint>:subject` or `<fingerprint>:issuer`
    pub fn key(&self, rt: &Runtime) -> TValue<String> {
        rt.field(self, "id", &self.key, || Ok(None))
    }

    /// RFC 4514 string form
    pub fn dn(&self, rt: &Runtime) -> TValue<String> {
        rt.field(self, "dn", &self.dn, || Ok(None))
    }

    /// Common name
    pub fn common_name(&self, rt: &Runtime) -> TValue<String> {
        rt.field(self, "commonName", &self.common_name, || Ok(None))
    }

    /// Organizations
    pub fn organization(&self, rt: &Runtime) -> TValue<Vec<String>> {
        rt.field(self, "organization", &self.organization, || Ok(None))
    }

    /// All attributes keyed by dotted OID
    pub fn names(&self, rt: &Runtime) -> TValue<BTreeMap<String, String>> {
        rt.field(self, "names", &self.names, || Ok(None))
    }
}

impl ResourceSchema for PkixName {
    const NAME: &'static str = "pkix.name";

    fn fields() -> Vec<FieldDef<Self>> {
        let strings = || Type::array(Type::String);
        vec![
            FieldDef::stored("id", Type::String, |r: &Self| &r.key),
            FieldDef::stored("dn", Type::String, |r: &Self| &r.dn),
            FieldDef::stored("serialNumber", Type::String, |r: &Self| &r.serial_number),
            FieldDef::stored("commonName", Type::String, |r: &Self| &r.common_name),
            FieldDef::stored("country", strings(), |r: &Self| &r.country),
            FieldDef::stored("organization", strings(), |r: &Self| &r.organization),
            FieldDef::stored(
                "organizationalUnit",
                strings(),
                |r: &Self| &r.organizational_unit,
            ),
            FieldDef::stored("locality", strings(), |r: &Self| &r.locality),
            FieldDef::stored("province", strings(), |r: &Self| &r.province),
            FieldDef::stored("streetAddress", strings(), |r: &Self| &r.street_address),
            FieldDef::stored("postalCode", strings(), |r: &Self| &r.postal_code),
            FieldDef::stored("names", Type::map(Type::String), |r: &Self| &r.names),
        ]
    }

    fn identity(&self, rt: &Runtime) -> Result<String> {
        self.key(rt)
            .into_result()?
            .ok_or_else(|| Error::invalid_argument("id", "required"))
    }
}

// ============================================================================
// pkix.extension
// ============================================================================

/// One certificate extension
#[derive(Debug, Default)]
pub struct PkixExtension {
    id: String,
    identifier: Slot<String>,
    critical: Slot<bool>,
    value: Slot<String>,
}

impl_resource!(PkixExtension);

impl PkixExtension {
    fn create(rt: &Runtime, ext: &ExtensionDetails, fingerprint: &str) -> Result<ResourceRef> {
        let mut args = Args::new();
        args.insert(
            "identifier".into(),
            RawData::string(format!("{fingerprint}:{}", ext.oid)),
        );
        args.insert("critical".into(), RawData::bool(ext.critical));
        args.insert("value".into(), RawData::string(ext.value.clone()));
        Ok(rt.create_typed::<Self>(args)?.to_ref())
    }

    /// `<fingerprint>:<oid>`
    pub fn identifier(&self, rt: &Runtime) -> TValue<String> {
        rt.field(self, "identifier", &self.identifier, || Ok(None))
    }

    /// Whether the extension is marked critical
    pub fn critical(&self, rt: &Runtime) -> TValue<bool> {
        rt.field(self, "critical", &self.critical, || Ok(None))
    }

    /// Readable value
    pub fn value(&self, rt: &Runtime) -> TValue<String> {
        rt.field(self, "value", &self.value, || Ok(None))
    }
}

impl ResourceSchema for PkixExtension {
    const NAME: &'static str = "pkix.extension";

    fn fields() -> Vec<FieldDef<Self>> {
        vec![
            FieldDef::stored("identifier", Type::String, |r: &Self| &r.identifier),
            FieldDef::stored("critical", Type::Bool, |r: &Self| &r.critical),
            FieldDef::stored("value", Type::String, |r: &Self| &r.value),
        ]
    }

    fn identity(&self, rt: &Runtime) -> Result<String> {
        self.identifier(rt)
            .into_result()?
            .ok_or_else(|| Error::invalid_argument("identifier", "required"))
    }
}

// ============================================================================
// pkix.sanExtension
// ============================================================================

/// Subject alternative names of a certificate
#[derive(Debug, Default)]
pub struct PkixSanExtension {
    id: String,
    extension: Slot<ResourceRef>,
    dns_names: Slot<Vec<String>>,
    ip_addresses: Slot<Vec<String>>,
    email_addresses: Slot<Vec<String>>,
    uris: Slot<Vec<String>>,
}

impl_resource!(PkixSanExtension);

impl PkixSanExtension {
    fn create(rt: &Runtime, san: &SanDetails, fingerprint: &str) -> Result<ResourceRef> {
        let extension = PkixExtension::create(rt, &san.extension, fingerprint)?;
        let mut args = Args::new();
        args.insert(
            "extension".into(),
            RawData::resource(extension.name, extension.id),
        );
        args.insert("dnsNames".into(), strings(san.dns_names.clone()));
        args.insert("ipAddresses".into(), strings(san.ip_addresses.clone()));
        args.insert("emailAddresses".into(), strings(san.email_addresses.clone()));
        args.insert("uris".into(), strings(san.uris.clone()));
        Ok(rt.create_typed::<Self>(args)?.to_ref())
    }

    /// The underlying `pkix.extension`
    pub fn extension(&self, rt: &Runtime) -> TValue<ResourceRef> {
        rt.field(self, "extension", &self.extension, || Ok(None))
    }

    /// DNS names
    pub fn dns_names(&self, rt: &Runtime) -> TValue<Vec<String>> {
        rt.field(self, "dnsNames", &self.dns_names, || Ok(None))
    }

    /// IP addresses
    pub fn ip_addresses(&self, rt: &Runtime) -> TValue<Vec<String>> {
        rt.field(self, "ipAddresses", &self.ip_addresses, || Ok(None))
    }

    /// Email addresses
    pub fn email_addresses(&self, rt: &Runtime) -> TValue<Vec<String>> {
        rt.field(self, "emailAddresses", &self.email_addresses, || Ok(None))
    }

    /// URIs
    pub fn uris(&self, rt: &Runtime) -> TValue<Vec<String>> {
        rt.field(self, "uris", &self.uris, || Ok(None))
    }
}

impl ResourceSchema for PkixSanExtension {
    const NAME: &'static str = "pkix.sanExtension";

    fn fields() -> Vec<FieldDef<Self>> {
        let strings = || Type::array(Type::String);
        vec![
            FieldDef::stored(
                "extension",
                Type::resource(PkixExtension::NAME),
                |r: &Self| &r.extension,
            ),
            FieldDef::stored("dnsNames", strings(), |r: &Self| &r.dns_names),
            FieldDef::stored("ipAddresses", strings(), |r: &Self| &r.ip_addresses),
            FieldDef::stored("emailAddresses", strings(), |r: &Self| &r.email_addresses),
            FieldDef::stored("uris", strings(), |r: &Self| &r.uris),
        ]
    }

    fn identity(&self, rt: &Runtime) -> Result<String> {
        self.extension(rt)
            .into_result()?
            .map(|ext| ext.id)
            .ok_or_else(|| Error::invalid_argument("extension", "required"))
    }
}
