//! Per-endpoint circuit breaker.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: endpoint assumed down, requests are refused without a network call
//! - Half-Open: a bounded number of trial requests test for recovery
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure_count >= failure_threshold
//! Open → Half-Open: reset_timeout elapsed since last failure (checked on gate)
//! Half-Open → Closed: any success
//! Half-Open → Open: any failure (fresh last_failure)
//! ```
//!
//! Records are created lazily per endpoint key and never removed. Updates to
//! one key are serialized by the map shard lock; overlapping requests to the
//! same endpoint still race between their own awaits, last write wins.

use arc_swap::ArcSwap;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use tokio::time::Instant;

use crate::config::BreakerConfig;
use crate::observability::metrics;

/// Circuit state for one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CircuitState {
    #[default]
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure bookkeeping for one endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CircuitRecord {
    pub failure_count: u32,
    pub last_failure: Option<Instant>,
    pub state: CircuitState,
    /// Trials permitted since entering Half-Open.
    pub half_open_trials: u32,
}

/// Registry of circuit records keyed by endpoint string.
pub struct CircuitBreakerRegistry {
    records: DashMap<String, CircuitRecord>,
    config: ArcSwap<BreakerConfig>,
}

impl CircuitBreakerRegistry {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            records: DashMap::new(),
            config: ArcSwap::from_pointee(config),
        }
    }

    /// Swap thresholds; existing records keep their counts.
    pub fn update_config(&self, config: BreakerConfig) {
        self.config.store(Arc::new(config));
    }

    /// Gate decision for `endpoint`.
    ///
    /// The only transition performed here is Open → Half-Open once the reset
    /// timeout has elapsed. Half-Open admits at most `half_open_max_calls`
    /// trials until an outcome is recorded.
    pub fn can_make_request(&self, endpoint: &str) -> bool {
        let config = self.config.load();
        let mut record = self.records.entry(endpoint.to_string()).or_default();

        match record.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let elapsed = record
                    .last_failure
                    .map(|at| Instant::now().duration_since(at))
                    .unwrap_or_default();
                if elapsed > config.reset_timeout() {
                    record.state = CircuitState::HalfOpen;
                    record.half_open_trials = 1;
                    tracing::debug!(endpoint = %endpoint, "Circuit half-open, admitting trial requests");
                    metrics::record_circuit_transition(CircuitState::HalfOpen.as_str());
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => {
                if record.half_open_trials < config.half_open_max_calls {
                    record.half_open_trials += 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Gate `endpoint` and, if admitted, return an [`Attempt`] that must be
    /// finished with the request's outcome.
    pub fn try_acquire<'a>(&'a self, endpoint: &'a str) -> Option<Attempt<'a>> {
        self.can_make_request(endpoint).then(|| Attempt {
            registry: self,
            endpoint,
            pending: true,
        })
    }

    /// Record the outcome of one completed request attempt.
    pub fn update(&self, endpoint: &str, success: bool) {
        let config = self.config.load();
        let mut record = self.records.entry(endpoint.to_string()).or_default();
        let previous = record.state;

        if success {
            record.failure_count = 0;
            record.half_open_trials = 0;
            record.state = CircuitState::Closed;
            if previous != CircuitState::Closed {
                tracing::info!(endpoint = %endpoint, from = %previous, "Circuit closed");
                metrics::record_circuit_transition(CircuitState::Closed.as_str());
            }
            return;
        }

        record.failure_count = record.failure_count.saturating_add(1);
        record.last_failure = Some(Instant::now());

        let reopen = previous == CircuitState::HalfOpen
            || (previous == CircuitState::Closed
                && record.failure_count >= config.failure_threshold);
        if reopen {
            record.state = CircuitState::Open;
            record.half_open_trials = 0;
            tracing::warn!(
                endpoint = %endpoint,
                failures = record.failure_count,
                reset_timeout_ms = config.reset_timeout_ms,
                "Circuit opened"
            );
            metrics::record_circuit_transition(CircuitState::Open.as_str());
        }
    }

    /// Current state, `Closed` for endpoints never seen.
    pub fn state(&self, endpoint: &str) -> CircuitState {
        self.records
            .get(endpoint)
            .map(|r| r.state)
            .unwrap_or_default()
    }

    pub fn snapshot(&self, endpoint: &str) -> Option<CircuitRecord> {
        self.records.get(endpoint).map(|r| r.value().clone())
    }

    /// Forget one endpoint's record.
    pub fn reset(&self, endpoint: &str) {
        self.records.remove(endpoint);
    }

    pub fn clear(&self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// An admitted request whose outcome has not been recorded yet.
///
/// Dropping it unfinished, e.g. when the request future is cancelled,
/// records a failure. Otherwise an abandoned Half-Open trial would hold its
/// slot and the circuit could never close or re-open.
#[must_use = "an unfinished attempt records a failure when dropped"]
pub struct Attempt<'a> {
    registry: &'a CircuitBreakerRegistry,
    endpoint: &'a str,
    pending: bool,
}

impl Attempt<'_> {
    pub fn finish(mut self, success: bool) {
        self.pending = false;
        self.registry.update(self.endpoint, success);
    }
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        if self.pending {
            tracing::debug!(endpoint = %self.endpoint, "Request abandoned, recording failure");
            self.registry.update(self.endpoint, false);
        }
    }
}

impl Default for CircuitBreakerRegistry {
    fn default() -> Self {
        Self::new(BreakerConfig::default())
    }
}
