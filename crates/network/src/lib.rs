//! Network provider
//!
//! Resources for certificates and the things they come from:
//! - `certificates`, `certificate`: PEM bundles and the X.509 certificates in them
//! - `pkix.name`, `pkix.extension`, `pkix.sanExtension`: parts of a certificate
//! - `url`: parsed URLs
//! - `file`: files read through the connection
//! - `parse.certificates`: certificates from a file or inline text
//!
//! ```ignore
//! let rt = Runtime::new(Arc::new(factgraph_network::provider()), conn);
//! let certs = rt.new_resource("parse.certificates", args)?;
//! let list = rt.get_data(&*certs, "list");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod certificate;
pub mod file;
pub mod parse;
pub mod pem;
pub mod url;

pub use certificate::{Certificate, Certificates, PkixExtension, PkixName, PkixSanExtension};
pub use file::File;
pub use parse::ParseCertificates;
pub use self::url::UrlResource;

use factgraph_engine::Provider;

/// Provider name announced to clients
pub const PROVIDER_NAME: &str = "network";

/// Schema with every network resource type
pub fn provider() -> Provider {
    Provider::builder(PROVIDER_NAME)
        .resource::<Certificates>()
        .resource::<Certificate>()
        .resource::<PkixName>()
        .resource::<PkixExtension>()
        .resource::<PkixSanExtension>()
        .resource::<UrlResource>()
        .resource::<File>()
        .resource::<ParseCertificates>()
        .build()
}
