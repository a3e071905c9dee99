use anyhow::{anyhow, Context, Result};
use oidc_refresher::refresh::{AwsRegistry, TlsCertificateFetcher};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::handlers::shutdown_signal;
use crate::router::build_router;
use crate::state::AppState;

/// Top-level orchestrator for the trigger HTTP server.
pub struct Runner {
    cfg: Config,
    listener: TcpListener,
    state: AppState,
    shutdown: CancellationToken,
}

impl Runner {
    /// Bind a TCP listener on the provided address, annotating errors with context.
    async fn bind(addr: SocketAddr) -> Result<TcpListener> {
        info!(%addr, "binding trigger listener");
        TcpListener::bind(addr)
            .await
            .with_context(|| format!("bind trigger addr {addr}"))
    }

    /// Serves refresh requests until a shutdown signal is received.
    pub async fn run(self) -> Result<()> {
        tracing::debug!("starting runner");

        let Runner {
            cfg,
            listener,
            state,
            shutdown,
        } = self;

        let app = build_router(state, cfg.request_timeout());

        let signal_token = shutdown.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            info!("shutdown signal received, exiting");
            signal_token.cancel();
        });

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .context("serve trigger endpoint")?;

        info!("trigger listener exited");
        Ok(())
    }
}

pub struct RunnerBuilder {
    cfg: Config,
    listener: Option<TcpListener>,
    state: Option<AppState>,
    shutdown: CancellationToken,
}

impl RunnerBuilder {
    pub fn from(cfg: Config) -> Self {
        Self {
            cfg,
            listener: None,
            state: None,
            shutdown: CancellationToken::new(),
        }
    }

    pub async fn bind(mut self) -> Result<Self> {
        let listener = Runner::bind(self.cfg.listen_addr).await?;
        self.listener = Some(listener);
        Ok(self)
    }

    /// Connects to IAM with the ambient AWS credentials and prepares the fetcher.
    pub async fn connect_registry(mut self) -> Result<Self> {
        let base = self.cfg.base_refresh_config();
        let certificates =
            TlsCertificateFetcher::new(&base).context("set up certificate fetcher")?;
        let registry = AwsRegistry::from_env().await;
        self.state = Some(AppState::new(
            Arc::new(registry),
            Arc::new(certificates),
            base,
        ));
        Ok(self)
    }

    pub fn build(self) -> Result<Runner> {
        let listener = self
            .listener
            .ok_or_else(|| anyhow!("trigger listener not bound"))?;
        let state = self
            .state
            .ok_or_else(|| anyhow!("registry not connected"))?;

        Ok(Runner {
            cfg: self.cfg,
            listener,
            state,
            shutdown: self.shutdown,
        })
    }
}

impl Runner {
    pub fn builder(cfg: Config) -> RunnerBuilder {
        RunnerBuilder::from(cfg)
    }
}
