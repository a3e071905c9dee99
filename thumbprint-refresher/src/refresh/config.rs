use crate::refresh::tag::TagFilter;
use std::time::Duration;

/// IAM accepts at most five thumbprints per OpenID Connect provider.
pub const IAM_MAX_THUMBPRINTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// What a run does when a single provider cannot be refreshed.
pub enum FailurePolicy {
    /// Stop at the first provider failure and return it.
    #[default]
    Abort,
    /// Record the failure against the provider ARN and move on.
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// How the TLS handshake with a jwks endpoint is verified.
pub enum HandshakeTrust {
    /// Accept whatever certificate the endpoint presents; it is recorded, not trusted.
    #[default]
    PresentedCertificate,
    /// Require a chain to the bundled web PKI roots and a matching host name.
    WebPki,
}

#[derive(Debug, Clone)]
/// Parameters of one refresh run. Built once at startup and never mutated.
pub struct RefreshConfig {
    /// Thumbprints kept per provider; 0 keeps all of them.
    pub max_thumbprints: u32,
    /// Compute everything but skip the registry write.
    pub dry_run: bool,
    pub verbose: bool,
    /// Append new fingerprints instead of replacing the list.
    pub append: bool,
    /// Providers to select; empty selects all of them.
    pub tags: TagFilter,
    pub failure_policy: FailurePolicy,
    pub handshake_trust: HandshakeTrust,
    /// Bound on the discovery document request.
    pub http_timeout: Duration,
    /// Bound on connect plus handshake with the jwks endpoint.
    pub tls_timeout: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            max_thumbprints: IAM_MAX_THUMBPRINTS,
            dry_run: false,
            verbose: false,
            append: true,
            tags: TagFilter::default(),
            failure_policy: FailurePolicy::Abort,
            handshake_trust: HandshakeTrust::PresentedCertificate,
            http_timeout: Duration::from_secs(30),
            tls_timeout: Duration::from_secs(30),
        }
    }
}
