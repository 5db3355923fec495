//! Range strategy resolution

use crate::domain::{LookupConfig, RangeStrategy};

/// Decides the effective range strategy for a dependency
pub trait RangeStrategyResolver: Send + Sync {
    fn resolve(&self, config: &LookupConfig) -> RangeStrategy;
}

/// Default resolver:
/// - explicit strategies are kept, except `in-range-only`, which runs as
///   `update-lockfile` (out-of-range results are dropped afterwards)
/// - `auto` updates only the lock file of unconstrained dependencies, widens
///   OR ranges and bumps everything else
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRangeStrategy;

impl RangeStrategyResolver for DefaultRangeStrategy {
    fn resolve(&self, config: &LookupConfig) -> RangeStrategy {
        match config.range_strategy {
            RangeStrategy::InRangeOnly => RangeStrategy::UpdateLockfile,
            RangeStrategy::Auto if config.is_unconstrained() => RangeStrategy::UpdateLockfile,
            RangeStrategy::Auto => {
                let is_or = config
                    .current_value
                    .as_deref()
                    .is_some_and(|value| value.contains("||"));
                if is_or {
                    RangeStrategy::Widen
                } else {
                    RangeStrategy::Bump
                }
            }
            explicit => explicit,
        }
    }
}
