use crate::state::{AppState, RefreshResponse};
use axum::body::Bytes;
use axum::http::StatusCode;
use axum::{extract::State, Json};
use oidc_refresher::refresh::{config_from_request, RefreshEngine};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use tokio::signal;
use tracing::{info, warn};

/// Liveness probe endpoint.
pub async fn ready() -> &'static str {
    "ready"
}

#[derive(Serialize)]
/// Static response body for `/health`.
pub struct Health {
    pub status: &'static str,
}

/// Readiness/health-check endpoint.
pub async fn health(State(_state): State<AppState>) -> (StatusCode, Json<Health>) {
    (StatusCode::OK, Json(Health { status: "ok" }))
}

/// Runs a refresh described by the request document in the body.
///
/// An empty body means "all defaults". The document is validated before any
/// provider is looked at; a rejected request never reaches the registry.
pub async fn refresh_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<JsonValue>) {
    let request = if body.is_empty() {
        JsonValue::Null
    } else {
        match serde_json::from_slice::<JsonValue>(&body) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "request body is not JSON");
                return invalid_request(format!("body is not JSON: {e}"));
            }
        }
    };

    let cfg = match config_from_request(request, state.base.clone()) {
        Ok(cfg) => cfg,
        Err(e) => return invalid_request(e.to_string()),
    };

    let _guard = state.run_lock.lock().await;
    info!(dry_run = cfg.dry_run, filter = %cfg.tags, "refresh requested");

    let engine = RefreshEngine::new(cfg, state.registry.clone(), state.certificates.clone());
    match engine.run().await {
        Ok(summary) => {
            let status = if summary.is_clean() {
                StatusCode::OK
            } else {
                StatusCode::BAD_GATEWAY
            };
            let body = RefreshResponse::from(summary);
            match serde_json::to_value(&body) {
                Ok(value) => (status, Json(value)),
                Err(e) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "serialize_failed", "message": e.to_string() })),
                ),
            }
        }
        Err(e) => {
            warn!(error = %e, "refresh failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "refresh_failed", "message": e.to_string() })),
            )
        }
    }
}

fn invalid_request(message: String) -> (StatusCode, Json<JsonValue>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "invalid_request", "message": message })),
    )
}

/// Blocks until Ctrl+C (or SIGTERM on Unix) to trigger graceful shutdown.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = ?e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = ?e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();
    tokio::select! { _ = ctrl_c => {}, _ = terminate => {}, };
}
