//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     Ctrl-C → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     broadcast → cache sweeper exits
//!               → CLI poll loop stops its poller
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
