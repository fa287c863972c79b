//! Tracing setup for the `mdtree` binary.

use anyhow::{anyhow, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "mdtree=warn";
const VERBOSE_LOG_FILTER: &str = "mdtree=debug";

/// Build the filter: `RUST_LOG` wins, otherwise warnings only, or debug
/// output when `verbose` is set.
pub fn env_filter(verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new(VERBOSE_LOG_FILTER);
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install a stderr fmt subscriber. Stdout stays reserved for command output.
pub fn init_logging(verbose: bool) -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .try_init()
        .map_err(|err| anyhow!("Failed to initialize logging: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_filter_overrides_default() {
        assert_eq!(env_filter(true).to_string(), VERBOSE_LOG_FILTER);
    }
}
