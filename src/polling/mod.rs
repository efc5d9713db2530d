//! Polling subsystem.
//!
//! # Data Flow
//! ```text
//! smart_poller.rs:
//!     poll → success: interval = base
//!          → failure: interval grows (resilience::backoff), capped
//!
//! visibility.rs:
//!     PageVisibility change → start/stop fixed-interval timer
//!
//! debounce.rs:
//!     burst of calls → one trailing invocation
//! ```

pub mod debounce;
pub mod smart_poller;
pub mod visibility;

pub use debounce::{debounce, Debouncer};
pub use smart_poller::SmartPoller;
pub use visibility::{create_visibility_aware_poller, PageVisibility, Visibility, VisibilityPoller};
