//! Log setup. Output goes to stderr so it never mixes with answers on stdout.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::consts::LOG_ENV;

/// Filter used when `BANKR_LOG` is unset.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose { "bankr=debug" } else { "bankr=warn" }
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are no-ops.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_levels() {
        assert_eq!(default_filter(false), "bankr=warn");
        assert_eq!(default_filter(true), "bankr=debug");
    }

    #[test]
    fn init_twice_is_harmless() {
        init(false);
        init(true);
        tracing::debug!("logging initialised");
    }
}
