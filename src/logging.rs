//! # Structured Logging Module
//!
//! Environment-aware tracing setup for debugging the async submission and
//! reconciliation flows. Degraded paths (queue fallbacks, absorbed storage
//! failures) are observable only through these events, so initialization is
//! expected early in process start.

use std::sync::OnceLock;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging once per process
///
/// The filter comes from `LEAD_RELAY_LOG` (falling back to `RUST_LOG`, then
/// an environment-based default); `LEAD_RELAY_LOG_FORMAT=json` switches to
/// JSON output for log shippers.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_env("LEAD_RELAY_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new(default_log_level(&get_environment())));

        let json = std::env::var("LEAD_RELAY_LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        // try_init so an embedding application's subscriber wins quietly
        let result = if json {
            tracing_subscriber::registry()
                .with(fmt::layer().json().with_target(true).with_filter(filter))
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_filter(filter))
                .try_init()
        };

        if result.is_err() {
            tracing::debug!("Global tracing subscriber already initialized, continuing");
        }
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var("LEAD_RELAY_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Default log level for an environment
fn default_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_detection() {
        std::env::set_var("LEAD_RELAY_ENV", "test_override");
        assert_eq!(get_environment(), "test_override");
        std::env::remove_var("LEAD_RELAY_ENV");
    }

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(default_log_level("production"), "info");
        assert_eq!(default_log_level("development"), "debug");
        assert_eq!(default_log_level("unknown"), "debug");
    }
}
