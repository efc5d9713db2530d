//! Metrics recording.
//!
//! Emits through the `metrics` facade. Nothing is exported unless the
//! embedding application installs a recorder.
//!
//! # Metrics
//! - `request_guard_calls_total` (counter): guarded calls by outcome
//! - `request_guard_cache_lookups_total` (counter): cache hits and misses
//! - `request_guard_cache_evictions_total` (counter): entries removed by sweeps
//! - `request_guard_circuit_transitions_total` (counter): breaker transitions by target state
//! - `request_guard_polls_total` (counter): poller runs by result

use metrics::counter;

/// Outcome of a single guarded call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    KillSwitch,
    CacheHit,
    CircuitOpen,
    Success,
    HttpError,
    TransportError,
}

impl CallOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallOutcome::KillSwitch => "kill_switch",
            CallOutcome::CacheHit => "cache_hit",
            CallOutcome::CircuitOpen => "circuit_open",
            CallOutcome::Success => "success",
            CallOutcome::HttpError => "http_error",
            CallOutcome::TransportError => "transport_error",
        }
    }
}

pub fn record_call(outcome: CallOutcome) {
    counter!("request_guard_calls_total", "outcome" => outcome.as_str()).increment(1);
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("request_guard_cache_lookups_total", "result" => result).increment(1);
}

pub fn record_cache_evictions(count: usize) {
    counter!("request_guard_cache_evictions_total").increment(count as u64);
}

pub fn record_circuit_transition(to: &'static str) {
    counter!("request_guard_circuit_transitions_total", "to" => to).increment(1);
}

pub fn record_poll(success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!("request_guard_polls_total", "result" => result).increment(1);
}
