//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GuardConfig (validated, immutable)
//!     → RequestGuard::new
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → RequestGuard::reload swaps settings atomically
//! ```
//!
//! Every field has a default, so an empty file is a valid config. Breaker
//! records and cache entries survive a reload; only thresholds change.

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    BackoffPolicy, BreakerConfig, CacheConfig, GuardConfig, KillSwitchConfig, MonitorConfig,
    ObservabilityConfig, PollerConfig,
};
pub use validation::ValidationError;
