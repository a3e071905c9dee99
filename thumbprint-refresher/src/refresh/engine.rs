use super::certs::PeerCertificate;
use super::config::{FailurePolicy, RefreshConfig};
use super::errors::RefreshError;
use super::fetcher::CertificateSource;
use super::registry::ProviderRegistry;
use super::thumbprints::update_thumbprint_list;
use super::types::{Provider, ProviderFailure, RefreshSummary};
use tracing::{error, info};

/// Refreshes the thumbprint lists of the selected providers, one after another.
pub struct RefreshEngine<R, C> {
    cfg: RefreshConfig,
    registry: R,
    certificates: C,
}

impl<R, C> RefreshEngine<R, C>
where
    R: ProviderRegistry,
    C: CertificateSource,
{
    pub fn new(cfg: RefreshConfig, registry: R, certificates: C) -> Self {
        Self {
            cfg,
            registry,
            certificates,
        }
    }

    /// ARNs of the providers selected by the tag filter, or of all providers.
    pub async fn discover(&self) -> Result<Vec<String>, RefreshError> {
        if self.cfg.tags.is_empty() {
            if self.cfg.verbose {
                info!("selecting all OIDC providers");
            }
            self.registry.list_all().await
        } else {
            if self.cfg.verbose {
                info!(filter = %self.cfg.tags, "selecting OIDC providers by tag filter");
            }
            self.registry.list_by_tags(&self.cfg.tags.to_query()).await
        }
    }

    /// Runs discovery, then fetch, update and (unless dry-run) persist per provider.
    ///
    /// A discovery failure always ends the run. A provider failure ends it
    /// under `FailurePolicy::Abort` and is recorded in the summary under
    /// `FailurePolicy::Continue`.
    pub async fn run(&self) -> Result<RefreshSummary, RefreshError> {
        let arns = self.discover().await?;

        let mut summary = RefreshSummary {
            dry_run: self.cfg.dry_run,
            ..RefreshSummary::default()
        };

        for arn in arns {
            summary.examined += 1;
            match self.refresh_provider(&arn).await {
                Ok(true) => summary.updated += 1,
                Ok(false) => {}
                Err(err) => match self.cfg.failure_policy {
                    FailurePolicy::Abort => return Err(err),
                    FailurePolicy::Continue => {
                        error!(arn = %arn, error = %err, "failed to refresh OIDC provider");
                        summary.failures.push(ProviderFailure {
                            arn,
                            error: err.to_string(),
                        });
                    }
                },
            }
        }

        info!("{}", summary.message());
        if !summary.failures.is_empty() {
            error!(
                failed = summary.failures.len(),
                "some OIDC providers could not be refreshed"
            );
        }
        Ok(summary)
    }

    /// Returns whether the provider's thumbprint list changed.
    async fn refresh_provider(&self, arn: &str) -> Result<bool, RefreshError> {
        let mut provider = self.registry.get(arn).await?;
        if !self.update_provider_thumbprint(&mut provider).await? {
            return Ok(false);
        }
        if !self.cfg.dry_run {
            self.registry
                .update_thumbprints(arn, &provider.thumbprints)
                .await?;
        }
        Ok(true)
    }

    /// Fetches the provider's current certificate and merges its fingerprint
    /// into the in-memory thumbprint list.
    pub async fn update_provider_thumbprint(
        &self,
        provider: &mut Provider,
    ) -> Result<bool, RefreshError> {
        let certificate = self.certificates.fetch(&provider.url).await?;
        let fingerprint = certificate.fingerprint();
        let changed = update_thumbprint_list(
            &mut provider.thumbprints,
            &fingerprint,
            self.cfg.max_thumbprints,
            self.cfg.append,
        );
        self.log_outcome(provider, &certificate, &fingerprint, changed);
        Ok(changed)
    }

    fn log_outcome(
        &self,
        provider: &Provider,
        certificate: &PeerCertificate,
        fingerprint: &str,
        changed: bool,
    ) {
        if changed {
            if self.cfg.verbose {
                info!(
                    not_after = certificate.not_after,
                    "new fingerprint {fingerprint} found of {}, subject {} issued by {}",
                    provider.url, certificate.subject, certificate.issuer
                );
            } else {
                info!(
                    not_after = certificate.not_after,
                    "new fingerprint {fingerprint} found of {} valid until {}",
                    provider.url, certificate.not_after_display
                );
            }
        } else if self.cfg.verbose {
            info!(
                "fingerprint of {} already in thumbprint list of OIDC provider",
                provider.url
            );
        }
    }
}
