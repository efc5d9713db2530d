//! Response caching subsystem.
//!
//! # Data Flow
//! ```text
//! Cacheable GET (opted in per call):
//!     → key = url + serialized options
//!     → store.rs lookup (fresh hit short-circuits the network)
//!     → on 2xx with a JSON body: store.rs insert with TTL
//!
//! Background:
//!     sweeper.rs → store.rs sweep every sweep_interval
//! ```

pub mod store;
pub mod sweeper;

pub use store::{CacheEntry, ResponseCache};
pub use sweeper::CacheSweeper;
