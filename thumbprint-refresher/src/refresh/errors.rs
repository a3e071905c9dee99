use thiserror::Error;

#[derive(Debug, Error)]
/// Failure taxonomy surfaced by discovery, certificate retrieval and persistence.
pub enum RefreshError {
    #[error("provider discovery failed: {0}")]
    Discovery(String),
    #[error("expected 200 from {url}, got {status}, {body}")]
    InvalidDiscoveryEndpoint {
        url: String,
        status: u16,
        body: String,
    },
    #[error("{url} did not return a proper openid configuration")]
    MalformedDiscoveryDocument { url: String },
    #[error("TLS connection to {host} failed: {reason}")]
    TlsConnection { host: String, reason: String },
    #[error("certificate decode failed: {0}")]
    Certificate(String),
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("registry request failed: {0}")]
    Registry(String),
    #[error("failed to update thumbprint list of {arn}: {reason}")]
    Persistence { arn: String, reason: String },
    #[error("invalid request: {0}")]
    Validation(String),
}
