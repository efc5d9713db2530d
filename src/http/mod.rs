//! Guarded HTTP client subsystem.
//!
//! # Data Flow
//! ```text
//! caller
//!     → request.rs (FetchOptions, FetchConfig, cache key)
//!     → fetch.rs (kill switch, monitor, cache, breaker)
//!     → transport.rs (reqwest or injected transport)
//!     → response.rs (GuardedResponse, network or cache)
//! ```

pub mod fetch;
pub mod request;
pub mod response;
pub mod transport;

pub use fetch::{GuardError, GuardResult, RequestGuard};
pub use request::{cache_key, FetchConfig, FetchOptions, HttpMethod};
pub use response::{GuardedResponse, ResponseSource};
pub use transport::{HttpTransport, ReqwestTransport, TransportError, TransportResponse};
