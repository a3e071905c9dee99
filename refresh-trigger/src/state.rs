use oidc_refresher::refresh::{CertificateSource, ProviderRegistry, RefreshConfig, RefreshSummary};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<dyn ProviderRegistry>,
    pub certificates: Arc<dyn CertificateSource>,
    /// Settings not carried by the request document.
    pub base: RefreshConfig,
    /// Held for the duration of a run so providers are never refreshed concurrently.
    pub run_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(
        registry: Arc<dyn ProviderRegistry>,
        certificates: Arc<dyn CertificateSource>,
        base: RefreshConfig,
    ) -> Self {
        Self {
            registry,
            certificates,
            base,
            run_lock: Arc::new(Mutex::new(())),
        }
    }
}

#[derive(Serialize)]
/// JSON body returned by `/refresh` once a run finished.
pub struct RefreshResponse {
    #[serde(flatten)]
    pub summary: RefreshSummary,
    pub message: String,
}

impl From<RefreshSummary> for RefreshResponse {
    fn from(summary: RefreshSummary) -> Self {
        let message = summary.message();
        Self { summary, message }
    }
}
