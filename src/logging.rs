// Tracing subscriber setup shared by the CLI commands

use tracing_subscriber::{fmt, EnvFilter};
use crate::config::LoggingConfig;

/// Install the global subscriber. `RUST_LOG` wins over the configured
/// level; `verbose` forces debug.
pub fn init_logging(config: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { config.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    let builder = fmt().with_env_filter(filter).with_target(false);

    // A second init (tests, repeated commands) is harmless
    let _ = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_init_does_not_panic() {
        let config = LoggingConfig::default();
        init_logging(&config, false);
        init_logging(&config, true);
    }
}
