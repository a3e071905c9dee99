use anyhow::Context;
use clap::Parser;
use oidc_refresher::refresh::{
    AwsRegistry, FailurePolicy, HandshakeTrust, RefreshConfig, RefreshEngine, Tag, TagFilter,
    TlsCertificateFetcher, IAM_MAX_THUMBPRINTS,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, anyhow::Error>;

/// Updates the thumbprint list of OpenID Connect providers.
///
/// By default, all OIDC provider thumbprints are checked. To only update
/// providers tagged with auto-refresh=true, run:
///
///   oidc-thumbprint-refresher --filter auto-refresh=true --force
#[derive(Debug, Parser)]
#[command(version, about, long_about)]
struct Cli {
    /// Select providers by tag, as Name=Value or Name. Repeatable.
    #[arg(long = "filter", value_name = "TAG")]
    tags: Vec<Tag>,

    /// Thumbprints to keep in the list.
    #[arg(long, default_value_t = IAM_MAX_THUMBPRINTS,
          value_parser = clap::value_parser!(u32).range(1..=IAM_MAX_THUMBPRINTS as i64))]
    max_thumbprints: u32,

    /// Show what would happen without updating any provider (the default).
    #[arg(long, overrides_with = "force")]
    dry_run: bool,

    /// Update the OIDC providers.
    #[arg(long, overrides_with = "dry_run")]
    force: bool,

    /// Show more detailed output.
    #[arg(long)]
    verbose: bool,

    /// Replace the thumbprint list with the current fingerprint instead of appending.
    #[arg(long)]
    replace: bool,

    /// Keep going when a provider fails and report all failures at the end.
    #[arg(long)]
    continue_on_error: bool,

    /// Verify the jwks endpoint certificate against the web PKI before recording it.
    #[arg(long)]
    strict_tls: bool,

    /// Timeout in seconds for the discovery document request.
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    http_timeout: u64,

    /// Timeout in seconds for connecting to and handshaking with the jwks endpoint.
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    tls_timeout: u64,
}

impl Cli {
    fn into_config(self) -> RefreshConfig {
        RefreshConfig {
            max_thumbprints: self.max_thumbprints,
            dry_run: self.dry_run || !self.force,
            verbose: self.verbose,
            append: !self.replace,
            tags: TagFilter::build(self.tags),
            failure_policy: if self.continue_on_error {
                FailurePolicy::Continue
            } else {
                FailurePolicy::Abort
            },
            handshake_trust: if self.strict_tls {
                HandshakeTrust::WebPki
            } else {
                HandshakeTrust::PresentedCertificate
            },
            http_timeout: Duration::from_secs(self.http_timeout),
            tls_timeout: Duration::from_secs(self.tls_timeout),
        }
    }
}

/// CLI entrypoint: discovers providers, refreshes their thumbprints, and reports.
#[tokio::main]
async fn main() -> CliResult<()> {
    setup_logging();

    let cfg = Cli::parse().into_config();
    let fetcher = TlsCertificateFetcher::new(&cfg).context("set up certificate fetcher")?;
    let registry = AwsRegistry::from_env().await;

    let engine = RefreshEngine::new(cfg, registry, fetcher);
    let summary = engine.run().await?;

    if !summary.is_clean() {
        for failure in &summary.failures {
            eprintln!("{}: {}", failure.arn, failure.error);
        }
        anyhow::bail!(
            "{} of {} OpenID connect providers could not be refreshed",
            summary.failures.len(),
            summary.examined
        );
    }
    Ok(())
}

/// Install a `tracing` subscriber using either `RUST_LOG` or `LOG_LEVEL`.
fn setup_logging() {
    let default = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .compact()
        .init();
}
