//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters through the metrics facade)
//!
//! Guarded fetch additionally feeds:
//!     → frequency.rs (rolling call counter, warns on request storms)
//! ```

pub mod frequency;
pub mod logging;
pub mod metrics;

pub use frequency::CallFrequencyMonitor;
