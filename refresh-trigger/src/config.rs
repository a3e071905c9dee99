use oidc_refresher::refresh::{HandshakeTrust, RefreshConfig};
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Clone, Debug, Deserialize)]
/// Runtime configuration loaded from `REFRESHER_*` environment variables.
pub struct Config {
    pub log_level: Option<String>,

    #[serde(default = "def_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Seconds allowed for a provider's discovery document request.
    #[serde(default = "def_remote_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Seconds allowed for connect plus handshake with a jwks endpoint.
    #[serde(default = "def_remote_timeout_secs")]
    pub tls_timeout_secs: u64,

    /// Seconds a whole `/refresh` request may take.
    #[serde(default = "def_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub strict_tls: bool,
}

impl Config {
    /// Populates the configuration from environment variables, honoring `.env`.
    pub fn from_env() -> anyhow::Result<Self> {
        tracing::debug!("fetching config");
        let _ = dotenvy::dotenv();
        let cfg: Self = envy::prefixed("REFRESHER_").from_env()?;
        Ok(cfg)
    }

    /// Emit the effective configuration via tracing.
    pub fn info(&self) {
        tracing::info!(
            listen_addr = %self.listen_addr,
            http_timeout_secs = self.http_timeout_secs,
            tls_timeout_secs = self.tls_timeout_secs,
            request_timeout_secs = self.request_timeout_secs,
            strict_tls = self.strict_tls,
            "effective config"
        );
        if self.listen_addr.ip().is_unspecified() {
            tracing::warn!("binding to 0.0.0.0, make sure this is intentional");
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Settings every request-driven run shares; the request fills in the rest.
    pub fn base_refresh_config(&self) -> RefreshConfig {
        RefreshConfig {
            handshake_trust: if self.strict_tls {
                HandshakeTrust::WebPki
            } else {
                HandshakeTrust::PresentedCertificate
            },
            http_timeout: Duration::from_secs(self.http_timeout_secs),
            tls_timeout: Duration::from_secs(self.tls_timeout_secs),
            ..RefreshConfig::default()
        }
    }
}

fn def_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn def_remote_timeout_secs() -> u64 {
    30
}

fn def_request_timeout_secs() -> u64 {
    900
}
