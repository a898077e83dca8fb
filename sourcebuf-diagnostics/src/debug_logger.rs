//! Structured logging setup

use sourcebuf_core::{CoreError, CoreResult};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Install a global fmt subscriber filtered by `filter`
///
/// `filter` uses the `EnvFilter` directive syntax, e.g.
/// `"sourcebuf_media=debug,info"`. Fails if the directives do not parse or a
/// global subscriber is already installed.
pub fn init_logging(filter: &str) -> CoreResult<()> {
    install(parse_filter(filter)?)
}

/// Check that `filter` is valid `EnvFilter` directive syntax
pub fn validate_log_filter(filter: &str) -> CoreResult<()> {
    parse_filter(filter).map(|_| ())
}

fn parse_filter(filter: &str) -> CoreResult<EnvFilter> {
    EnvFilter::try_new(filter).map_err(|e| CoreError::InvalidConfiguration {
        field: "log_filter".to_string(),
        reason: e.to_string(),
    })
}

/// Install a global fmt subscriber filtered by `RUST_LOG`, falling back to
/// [`DEFAULT_LOG_FILTER`]
pub fn init_logging_from_env() -> CoreResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    install(env_filter)
}

fn install(env_filter: EnvFilter) -> CoreResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .map_err(|e| CoreError::InvalidConfiguration {
            field: "log_filter".to_string(),
            reason: format!("failed to install subscriber: {}", e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_log_filter() {
        assert!(validate_log_filter("info").is_ok());
        assert!(validate_log_filter("sourcebuf_media=debug,warn").is_ok());
    }

    #[test]
    fn test_subscriber_installed_once() {
        assert!(init_logging("sourcebuf_media=debug,info").is_ok());

        let error = init_logging("info").unwrap_err();
        assert_eq!(error.error_code(), "INVALID_CONFIGURATION");
        assert!(init_logging_from_env().is_err());
    }
}
