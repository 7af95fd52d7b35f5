//! Tunables for planning and execution.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Limits for the dependency resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Deepest sub-crafting level explored (the target is level 0)
    pub max_depth: usize,

    /// How long producer lookups stay memoized, in milliseconds
    pub cache_ttl_ms: u64,

    /// Upper bound for quantity maximization
    pub max_quantity: u32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            cache_ttl_ms: 5_000,
            max_quantity: 64,
        }
    }
}

impl ResolverConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the depth bound.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the producer memo lifetime.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the quantity cap.
    pub fn with_max_quantity(mut self, max: u32) -> Self {
        self.max_quantity = max;
        self
    }

    /// Producer memo lifetime.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }
}

/// Pacing for the execution scheduler, in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Delay before the first step
    pub initial_delay_ticks: u32,

    /// Delay between consecutive steps
    pub ticks_between_steps: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            initial_delay_ticks: 1,
            ticks_between_steps: 3,
        }
    }
}

impl SchedulerConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial delay. Zero is raised to one tick.
    pub fn with_initial_delay(mut self, ticks: u32) -> Self {
        self.initial_delay_ticks = ticks.max(1);
        self
    }

    /// Set the inter-step delay. Zero is raised to one tick.
    pub fn with_ticks_between_steps(mut self, ticks: u32) -> Self {
        self.ticks_between_steps = ticks.max(1);
        self
    }
}

/// Combined configuration, as stored in a world file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutocraftConfig {
    /// Resolver limits
    pub resolver: ResolverConfig,

    /// Scheduler pacing
    pub scheduler: SchedulerConfig,
}
