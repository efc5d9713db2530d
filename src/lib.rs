//! Client-side request guard for HTTP/JSON backends.
//!
//! Wraps outgoing calls with per-endpoint circuit breaking, short-lived
//! response caching, a call-frequency diagnostic and a kill switch, and
//! provides backoff, visibility-aware and debounced polling helpers.
//!
//! ```text
//!  caller ──▶ RequestGuard::fetch ──▶ kill switch ──▶ frequency monitor
//!                                                        │
//!                      cache hit ◀── response cache ◀────┘
//!                                         │ miss
//!                                         ▼
//!                                  circuit breaker ──▶ transport (reqwest)
//! ```

pub mod cache;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod polling;
pub mod resilience;

pub use config::GuardConfig;
pub use http::{FetchConfig, FetchOptions, GuardError, GuardedResponse, RequestGuard};
pub use lifecycle::Shutdown;
pub use polling::{create_visibility_aware_poller, debounce, PageVisibility, SmartPoller};
