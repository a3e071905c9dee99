use crate::config::Config;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// SDK crates that log every credential lookup and retry at info.
const QUIET_SDK: &str = "aws_config=warn,aws_smithy_runtime=warn";

/// Filter directive for the service: `RUST_LOG` verbatim when set, otherwise
/// `REFRESHER_LOG_LEVEL` (default `info`) with the AWS SDK held at warn.
fn filter_directive(rust_log: Option<String>, log_level: Option<&str>) -> String {
    match rust_log {
        Some(directive) if !directive.trim().is_empty() => directive,
        _ => format!("{},{QUIET_SDK}", log_level.unwrap_or("info")),
    }
}

pub fn setup_logging(cfg: &Config) {
    let directive = filter_directive(std::env::var("RUST_LOG").ok(), cfg.log_level.as_deref());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    debug!(%directive, "logging initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_log_wins() {
        assert_eq!(
            filter_directive(Some("debug".into()), Some("warn")),
            "debug"
        );
    }

    #[test]
    fn log_level_quiets_sdk() {
        assert_eq!(
            filter_directive(None, Some("debug")),
            "debug,aws_config=warn,aws_smithy_runtime=warn"
        );
        assert!(filter_directive(Some("  ".into()), None).starts_with("info,"));
    }
}
