//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Guarded call:
//!     → kill_switch.rs (refuse everything when disabled)
//!     → circuit_breaker.rs (gate per endpoint, record outcome)
//!     → timeouts.rs (optional per-call deadline)
//!
//! Pollers:
//!     → backoff.rs (grow the interval on failure, reset on success)
//! ```
//!
//! Refusals from the kill switch or an open circuit are not errors; the
//! guard reports them as "not attempted" and they never count as failures.

pub mod backoff;
pub mod circuit_breaker;
pub mod kill_switch;
pub mod timeouts;

pub use circuit_breaker::{Attempt, CircuitBreakerRegistry, CircuitRecord, CircuitState};
pub use kill_switch::KillSwitch;
