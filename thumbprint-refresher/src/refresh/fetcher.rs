use crate::refresh::certs::PeerCertificate;
use crate::refresh::config::{HandshakeTrust, RefreshConfig};
use crate::refresh::errors::RefreshError;
use crate::refresh::util::normalize_url;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::debug;
use url::{Host, Url};

const DISCOVERY_PATH: &str = "/.well-known/openid-configuration";
const DEFAULT_TLS_PORT: u16 = 443;

/// Retrieves the certificate currently served for a provider's signing keys.
#[async_trait]
pub trait CertificateSource: Send + Sync {
    async fn fetch(&self, base_url: &str) -> Result<PeerCertificate, RefreshError>;
}

#[async_trait]
impl<T: CertificateSource + ?Sized> CertificateSource for Arc<T> {
    async fn fetch(&self, base_url: &str) -> Result<PeerCertificate, RefreshError> {
        (**self).fetch(base_url).await
    }
}

#[derive(Debug, Deserialize)]
struct DiscoveryDocument {
    jwks_uri: Option<String>,
}

/// Reads the discovery document over HTTPS, then handshakes with the
/// `jwks_uri` host and returns the leaf certificate it presents.
pub struct TlsCertificateFetcher {
    http: reqwest::Client,
    connector: TlsConnector,
    tls_timeout: Duration,
}

impl TlsCertificateFetcher {
    pub fn new(cfg: &RefreshConfig) -> Result<Self, RefreshError> {
        let http = reqwest::Client::builder()
            .timeout(cfg.http_timeout)
            .build()
            .map_err(|e| RefreshError::Http(format!("build HTTP client: {e}")))?;
        let tls = client_config(cfg.handshake_trust)?;
        Ok(Self {
            http,
            connector: TlsConnector::from(Arc::new(tls)),
            tls_timeout: cfg.tls_timeout,
        })
    }

    /// Fetches `{url}/.well-known/openid-configuration` and returns its `jwks_uri`.
    pub async fn discover_jwks_uri(&self, url: &str) -> Result<String, RefreshError> {
        let wks = format!("{}{DISCOVERY_PATH}", url.trim_end_matches('/'));
        debug!(url = %wks, "fetching openid configuration");

        let response = self
            .http
            .get(&wks)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| RefreshError::Http(format!("GET {wks}: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RefreshError::Http(format!("read body of {wks}: {e}")))?;
        if status != StatusCode::OK {
            return Err(RefreshError::InvalidDiscoveryEndpoint {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let document: DiscoveryDocument = serde_json::from_str(&body)
            .map_err(|_| RefreshError::MalformedDiscoveryDocument { url: wks.clone() })?;
        document
            .jwks_uri
            .ok_or(RefreshError::MalformedDiscoveryDocument { url: wks })
    }

    /// Opens a TLS session to `host:port` and takes the peer's leaf certificate.
    pub async fn peer_certificate(
        &self,
        host: &str,
        port: u16,
    ) -> Result<PeerCertificate, RefreshError> {
        let tls_err = |reason: String| RefreshError::TlsConnection {
            host: format!("{host}:{port}"),
            reason,
        };

        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| tls_err(format!("invalid server name: {e}")))?;

        let handshake = async {
            let tcp = TcpStream::connect((host, port))
                .await
                .map_err(|e| tls_err(format!("connect: {e}")))?;
            self.connector
                .connect(server_name, tcp)
                .await
                .map_err(|e| tls_err(format!("handshake: {e}")))
        };
        let mut stream = tokio::time::timeout(self.tls_timeout, handshake)
            .await
            .map_err(|_| tls_err(format!("timed out after {:?}", self.tls_timeout)))??;

        let der = stream
            .get_ref()
            .1
            .peer_certificates()
            .and_then(|chain| chain.first())
            .map(|leaf| leaf.as_ref().to_vec())
            .ok_or_else(|| tls_err("peer presented no certificate".into()))?;

        if let Err(e) = stream.shutdown().await {
            debug!(host, error = %e, "TLS shutdown failed");
        }

        PeerCertificate::from_der(der)
    }
}

#[async_trait]
impl CertificateSource for TlsCertificateFetcher {
    async fn fetch(&self, base_url: &str) -> Result<PeerCertificate, RefreshError> {
        let url = normalize_url(base_url);
        let jwks_uri = self.discover_jwks_uri(&url).await?;
        let (host, port) = jwks_endpoint(&jwks_uri)?;
        debug!(jwks_uri = %jwks_uri, host = %host, port, "retrieving jwks certificate");
        self.peer_certificate(&host, port).await
    }
}

/// Host and port of the jwks endpoint. An explicit port in `jwks_uri` takes
/// precedence over the default of 443.
pub fn jwks_endpoint(jwks_uri: &str) -> Result<(String, u16), RefreshError> {
    let malformed = || RefreshError::MalformedDiscoveryDocument {
        url: jwks_uri.to_string(),
    };
    let parsed = Url::parse(jwks_uri).map_err(|_| malformed())?;
    let host = match parsed.host().ok_or_else(malformed)? {
        Host::Domain(domain) => domain.to_string(),
        Host::Ipv4(ip) => ip.to_string(),
        Host::Ipv6(ip) => ip.to_string(),
    };
    Ok((host, parsed.port().unwrap_or(DEFAULT_TLS_PORT)))
}

fn client_config(trust: HandshakeTrust) -> Result<ClientConfig, RefreshError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| RefreshError::TlsConnection {
            host: "-".into(),
            reason: format!("configure TLS client: {e}"),
        })?;

    let cfg = match trust {
        HandshakeTrust::PresentedCertificate => builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(PresentedCertificateVerifier { provider }))
            .with_no_client_auth(),
        HandshakeTrust::WebPki => {
            let roots = RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
            builder.with_root_certificates(roots).with_no_client_auth()
        }
    };
    Ok(cfg)
}

/// Accepts any certificate chain and host name. The handshake signature is
/// still checked, so the peer must hold the key of the certificate it shows.
#[derive(Debug)]
struct PresentedCertificateVerifier {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for PresentedCertificateVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
