use crate::refresh::config::{FailurePolicy, RefreshConfig, IAM_MAX_THUMBPRINTS};
use crate::refresh::errors::RefreshError;
use crate::refresh::tag::{Tag, TagFilter};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::error;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
/// Refresh request document accepted by the event-triggered entry point.
pub struct RefreshRequest {
    pub verbose: bool,
    pub dry_run: bool,
    pub append: bool,
    /// Thumbprints kept per provider, 0 means unlimited.
    pub max_thumbprints: u32,
    /// `key=value` or bare `key` selectors.
    pub tags: Vec<String>,
    pub continue_on_error: bool,
}

impl Default for RefreshRequest {
    /// Appends to the existing list so the outgoing certificate stays trusted
    /// while a provider rotates its signing keys.
    fn default() -> Self {
        Self {
            verbose: false,
            dry_run: false,
            append: true,
            max_thumbprints: 0,
            tags: Vec::new(),
            continue_on_error: false,
        }
    }
}

impl RefreshRequest {
    /// Checks value ranges the type alone cannot express.
    pub fn check(&self) -> Result<(), RefreshError> {
        if self.max_thumbprints > IAM_MAX_THUMBPRINTS {
            return Err(RefreshError::Validation(format!(
                "max_thumbprints: {} is greater than the maximum of {IAM_MAX_THUMBPRINTS}",
                self.max_thumbprints
            )));
        }
        Ok(())
    }

    /// Turns the request into the configuration of a run, keeping the
    /// remaining settings of `base` (timeouts, handshake trust).
    pub fn into_config(self, base: RefreshConfig) -> RefreshConfig {
        RefreshConfig {
            max_thumbprints: self.max_thumbprints,
            dry_run: self.dry_run,
            verbose: self.verbose,
            append: self.append,
            tags: self.tags.iter().map(|s| Tag::parse(s)).collect::<TagFilter>(),
            failure_policy: if self.continue_on_error {
                FailurePolicy::Continue
            } else {
                FailurePolicy::Abort
            },
            ..base
        }
    }
}

/// Validates an untyped request against the closed request schema and fills
/// in defaults. Unknown fields, wrong types and out-of-range values are rejected.
pub fn validate_request(request: JsonValue) -> Result<RefreshRequest, RefreshError> {
    let parsed = match request {
        JsonValue::Null => RefreshRequest::default(),
        other => serde_json::from_value::<RefreshRequest>(other)
            .map_err(|e| RefreshError::Validation(e.to_string()))?,
    };
    parsed.check()?;
    Ok(parsed)
}

/// `validate_request` followed by `RefreshRequest::into_config`, logging the rejection.
pub fn config_from_request(
    request: JsonValue,
    base: RefreshConfig,
) -> Result<RefreshConfig, RefreshError> {
    match validate_request(request) {
        Ok(parsed) => Ok(parsed.into_config(base)),
        Err(err) => {
            error!(error = %err, "invalid request received");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refresh::thumbprints::update_thumbprint_list;
    use serde_json::json;

    #[test]
    fn empty_request_gets_defaults() {
        let parsed = validate_request(json!({})).unwrap();
        assert_eq!(
            parsed,
            RefreshRequest {
                verbose: false,
                dry_run: false,
                append: true,
                max_thumbprints: 0,
                tags: vec![],
                continue_on_error: false,
            }
        );
    }

    #[test]
    fn null_request_gets_defaults() {
        assert_eq!(validate_request(JsonValue::Null).unwrap(), RefreshRequest::default());
    }

    #[test]
    fn negative_max_is_rejected() {
        let err = validate_request(json!({ "max_thumbprints": -1 })).unwrap_err();
        assert!(matches!(err, RefreshError::Validation(_)));
    }

    #[test]
    fn max_above_iam_limit_is_rejected() {
        let err = validate_request(json!({ "max_thumbprints": 6 })).unwrap_err();
        assert!(err.to_string().contains("max_thumbprints"));
        assert!(validate_request(json!({ "max_thumbprints": 5 })).is_ok());
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = validate_request(json!({ "dryRun": true })).unwrap_err();
        assert!(err.to_string().contains("dryRun"));
    }

    #[test]
    fn wrong_type_is_rejected() {
        assert!(validate_request(json!({ "verbose": "yes" })).is_err());
        assert!(validate_request(json!({ "tags": "auto-refresh=true" })).is_err());
        assert!(validate_request(json!({ "max_thumbprints": 2.5 })).is_err());
        assert!(validate_request(json!([1, 2])).is_err());
    }

    #[test]
    fn full_request_becomes_config() {
        let request = json!({
            "verbose": true,
            "dry_run": true,
            "max_thumbprints": 3,
            "tags": ["auto-refresh=true", "team"]
        });
        let cfg = config_from_request(request, RefreshConfig::default()).unwrap();
        assert!(cfg.verbose);
        assert!(cfg.dry_run);
        assert!(cfg.append);
        assert_eq!(cfg.max_thumbprints, 3);
        assert_eq!(cfg.failure_policy, FailurePolicy::Abort);

        let query = cfg.tags.to_query();
        assert_eq!(query.len(), 2);
        assert_eq!(query[0].key, "auto-refresh");
        assert_eq!(query[0].values, vec!["true"]);
        assert_eq!(query[1].key, "team");
        assert!(query[1].values.is_empty());
    }

    #[test]
    fn empty_request_keeps_outgoing_thumbprint() {
        let cfg = config_from_request(json!({}), RefreshConfig::default()).unwrap();
        let mut list = vec!["outgoing".to_string()];
        assert!(update_thumbprint_list(
            &mut list,
            "incoming",
            cfg.max_thumbprints,
            cfg.append
        ));
        assert_eq!(list, vec!["outgoing", "incoming"]);
    }

    #[test]
    fn append_false_replaces() {
        let cfg = config_from_request(json!({ "append": false }), RefreshConfig::default()).unwrap();
        assert!(!cfg.append);
    }

    #[test]
    fn base_settings_survive() {
        let base = RefreshConfig {
            http_timeout: std::time::Duration::from_secs(3),
            ..RefreshConfig::default()
        };
        let cfg = config_from_request(json!({ "continue_on_error": true }), base).unwrap();
        assert_eq!(cfg.http_timeout, std::time::Duration::from_secs(3));
        assert_eq!(cfg.failure_policy, FailurePolicy::Continue);
    }
}
