//! Identity resolver timing.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Ceiling for a single profile, membership or session fetch.
const fn default_fetch_timeout_ms() -> u64 {
    5_000
}

/// Ceiling for a whole resolution cycle.
const fn default_cycle_timeout_ms() -> u64 {
    10_000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    #[serde(default = "default_cycle_timeout_ms")]
    pub cycle_timeout_ms: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: default_fetch_timeout_ms(),
            cycle_timeout_ms: default_cycle_timeout_ms(),
        }
    }
}

impl ResolverConfig {
    pub const fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub const fn cycle_timeout(&self) -> Duration {
        Duration::from_millis(self.cycle_timeout_ms)
    }

    /// Check that both ceilings are non-zero and the cycle ceiling is not
    /// shorter than a single fetch.
    pub fn validate(&self) -> Result<(), crate::ConfigError> {
        if self.fetch_timeout_ms == 0 {
            return Err(crate::ConfigError::ResolverTimeout {
                field: "resolver.fetch_timeout_ms",
                reason: "must be greater than zero".into(),
            });
        }
        if self.cycle_timeout_ms < self.fetch_timeout_ms {
            return Err(crate::ConfigError::ResolverTimeout {
                field: "resolver.cycle_timeout_ms",
                reason: format!(
                    "must be at least fetch_timeout_ms ({})",
                    self.fetch_timeout_ms
                ),
            });
        }
        Ok(())
    }
}
