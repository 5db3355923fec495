//! Diagnostic logging
//!
//! Logs go to stderr; stdout is reserved for lookup results.

use tracing_subscriber::filter::EnvFilter;

/// Default level when neither flags nor `RUST_LOG` say otherwise
pub const DEFAULT_LEVEL: &str = "warn";

/// Build an `EnvFilter` based on CLI flags and environment.
///
/// Priority: quiet flag > verbose flag > RUST_LOG env > `warn`
pub fn env_filter(verbose: bool, quiet: bool) -> EnvFilter {
    if quiet {
        return EnvFilter::new("error");
    }
    if verbose {
        return EnvFilter::new("deplookup=debug");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}

/// Install the global subscriber. Calling it twice is a no-op.
pub fn init(verbose: bool, quiet: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose, quiet))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_wins() {
        assert_eq!(env_filter(true, true).to_string(), "error");
    }

    #[test]
    fn test_verbose() {
        assert_eq!(env_filter(true, false).to_string(), "deplookup=debug");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(false, true);
        init(false, true);
    }
}
