use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
/// An IAM OpenID Connect provider as loaded from the registry.
pub struct Provider {
    pub arn: String,
    /// Issuer URL, possibly without scheme.
    pub url: String,
    /// Oldest first.
    pub thumbprints: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
/// A provider that could not be refreshed under `FailurePolicy::Continue`.
pub struct ProviderFailure {
    pub arn: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
/// Outcome of a refresh run.
pub struct RefreshSummary {
    /// Providers looked at.
    pub examined: usize,
    /// Providers whose thumbprint list changed, persisted or not.
    pub updated: usize,
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ProviderFailure>,
}

impl RefreshSummary {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// One-line report of the run.
    pub fn message(&self) -> String {
        if self.dry_run {
            format!(
                "would update {} of {} OpenID connect providers, but no changes were made",
                self.updated, self.examined
            )
        } else {
            format!(
                "found {} OpenID connect providers, {} of which were updated",
                self.examined, self.updated
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dry_run_message() {
        let summary = RefreshSummary {
            examined: 1,
            updated: 1,
            dry_run: true,
            failures: vec![],
        };
        assert_eq!(
            summary.message(),
            "would update 1 of 1 OpenID connect providers, but no changes were made"
        );
    }

    #[test]
    fn live_message() {
        let summary = RefreshSummary {
            examined: 3,
            updated: 2,
            dry_run: false,
            failures: vec![],
        };
        assert_eq!(
            summary.message(),
            "found 3 OpenID connect providers, 2 of which were updated"
        );
    }
}
