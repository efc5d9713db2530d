//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the guard.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the request guard.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct GuardConfig {
    /// Per-endpoint circuit breaker settings.
    pub breaker: BreakerConfig,

    /// Response cache settings.
    pub cache: CacheConfig,

    /// Call-frequency diagnostic settings.
    pub monitor: MonitorConfig,

    /// Backoff poller settings.
    pub poller: PollerConfig,

    /// Kill switch settings.
    pub kill_switch: KillSwitchConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BreakerConfig {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,

    /// Time an open circuit waits before admitting trials, in milliseconds.
    pub reset_timeout_ms: u64,

    /// Trial requests allowed while half-open.
    pub half_open_max_calls: u32,
}

impl BreakerConfig {
    pub fn reset_timeout(&self) -> Duration {
        Duration::from_millis(self.reset_timeout_ms)
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            reset_timeout_ms: 30_000,
            half_open_max_calls: 3,
        }
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL applied when a call opts into caching without its own TTL.
    pub default_ttl_ms: u64,

    /// How often the sweeper evicts expired entries.
    pub sweep_interval_ms: u64,
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_ms: 300_000,
            sweep_interval_ms: 300_000,
        }
    }
}

/// Call-frequency monitor configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    /// Length of the rolling window in seconds.
    pub window_secs: u64,

    /// Calls per window above which a warning is logged.
    pub max_calls_per_window: u32,
}

impl MonitorConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            window_secs: 60,
            max_calls_per_window: 20,
        }
    }
}

/// How a poller grows its interval after a failure.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackoffPolicy {
    /// Multiplies the previous interval by `2^failures`.
    #[default]
    Compounding,
    /// Recomputes `base * 2^failures` from the base interval.
    Standard,
}

/// Backoff poller configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PollerConfig {
    /// Interval between polls while healthy, in milliseconds.
    pub base_interval_ms: u64,

    /// Upper bound on the backed-off interval, in milliseconds.
    pub max_interval_ms: u64,

    /// Interval growth policy.
    pub backoff_policy: BackoffPolicy,
}

impl PollerConfig {
    pub fn base_interval(&self) -> Duration {
        Duration::from_millis(self.base_interval_ms)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            base_interval_ms: 5_000,
            max_interval_ms: 300_000,
            backoff_policy: BackoffPolicy::Compounding,
        }
    }
}

/// Kill switch configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct KillSwitchConfig {
    /// Environment variable consulted on every guarded call.
    pub env_var: String,
}

impl Default for KillSwitchConfig {
    fn default() -> Self {
        Self {
            env_var: "DISABLE_POLLING".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Use ANSI colors in log output.
    pub ansi: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            ansi: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_constants() {
        let config = GuardConfig::default();
        assert_eq!(config.breaker.failure_threshold, 3);
        assert_eq!(config.breaker.reset_timeout(), Duration::from_secs(30));
        assert_eq!(config.cache.default_ttl(), Duration::from_secs(300));
        assert_eq!(config.monitor.max_calls_per_window, 20);
        assert_eq!(config.poller.base_interval(), Duration::from_secs(5));
        assert_eq!(config.poller.max_interval(), Duration::from_secs(300));
        assert_eq!(config.poller.backoff_policy, BackoffPolicy::Compounding);
        assert_eq!(config.kill_switch.env_var, "DISABLE_POLLING");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: GuardConfig = toml::from_str(
            r#"
            [breaker]
            failure_threshold = 5

            [poller]
            backoff_policy = "standard"
            "#,
        )
        .unwrap();

        assert_eq!(config.breaker.failure_threshold, 5);
        assert_eq!(config.breaker.reset_timeout_ms, 30_000);
        assert_eq!(config.poller.backoff_policy, BackoffPolicy::Standard);
        assert_eq!(config.cache, CacheConfig::default());
    }
}
