pub mod config;
pub mod engine;
pub mod errors;
pub mod fetcher;
pub mod registry;
pub mod request;
pub mod tag;
pub mod thumbprints;
pub mod types;

mod certs;
mod util;

pub use certs::PeerCertificate;
pub use config::{FailurePolicy, HandshakeTrust, RefreshConfig, IAM_MAX_THUMBPRINTS};
pub use engine::RefreshEngine;
pub use errors::RefreshError;
pub use fetcher::{CertificateSource, TlsCertificateFetcher};
pub use registry::{AwsRegistry, ProviderRegistry};
pub use request::{config_from_request, validate_request, RefreshRequest};
pub use tag::{Tag, TagFilter, TagQuery};
pub use thumbprints::{fingerprint_of, update_thumbprint_list};
pub use types::{Provider, ProviderFailure, RefreshSummary};
