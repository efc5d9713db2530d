//! Optional per-call deadline.
//!
//! Guarded calls carry no deadline by default; a hung request holds its
//! caller until the transport gives up. When a deadline is set, expiry is
//! reported as `TransportError::Timeout` and counts as a breaker failure.

use std::future::Future;
use std::time::Duration;

use crate::http::transport::TransportError;

/// Run `fut`, bounded by `deadline` when one is given.
pub async fn with_deadline<F, T>(deadline: Option<Duration>, fut: F) -> Result<T, TransportError>
where
    F: Future<Output = Result<T, TransportError>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| TransportError::Timeout(limit))?,
        None => fut.await,
    }
}
