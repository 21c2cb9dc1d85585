//! Global subscriber setup for embedding applications and tests.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use mneme_core::config::ObservabilityConfig;
use mneme_core::errors::{MnemeError, MnemeResult};

/// Environment variable holding an `EnvFilter` directive, e.g.
/// `MNEME_LOG=mneme_causal=debug,info`.
pub const LOG_ENV_VAR: &str = "MNEME_LOG";

/// Filter from `MNEME_LOG`, falling back to `config.log_level`.
pub fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(&config.log_level))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_tracing(config: &ObservabilityConfig) -> MnemeResult<()> {
    let filter = env_filter(config);
    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json_logs {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer()).try_init()
    };
    result.map_err(|e| MnemeError::ConfigError(format!("tracing init: {e}")))
}
