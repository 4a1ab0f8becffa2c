// src/infra/logger.rs — Structured logging with tracing

use tracing_subscriber::{fmt, EnvFilter};

use crate::infra::config::LoggingConfig;

/// Install the global subscriber. RUST_LOG overrides the configured level
/// when set; `json` switches the output from human-readable compact lines
/// to one JSON object per event for log shippers.
pub fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = fmt().with_env_filter(filter).with_target(false);
    if config.json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Only one test may install the global subscriber per test binary.
    #[test]
    fn test_init_logging_json_output() {
        let config = LoggingConfig {
            level: "debug".into(),
            json: true,
        };
        init_logging(&config);
    }
}
