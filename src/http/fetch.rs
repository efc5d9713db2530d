//! Guarded fetch entry point.
//!
//! # Sequence per call
//! 1. Kill switch enabled → `Ok(None)`
//! 2. Count the call in the frequency monitor (diagnostic only)
//! 3. Opted-in cacheable GET → fresh cache hit returns immediately
//! 4. Circuit open for the endpoint → `Ok(None)`
//! 5. Network call; outcome recorded in the breaker; 2xx JSON cached
//!
//! `Ok(None)` means "not attempted" and is never a failure. Transport errors
//! are recorded and then returned as `Err`. A call whose future is dropped
//! after passing the breaker is recorded as a failure.

use arc_swap::ArcSwap;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use url::Url;

use crate::cache::{CacheSweeper, ResponseCache};
use crate::config::{CacheConfig, GuardConfig};
use crate::http::request::{cache_key, FetchConfig, FetchOptions};
use crate::http::response::GuardedResponse;
use crate::http::transport::{HttpTransport, ReqwestTransport, TransportError};
use crate::observability::metrics::{self, CallOutcome};
use crate::observability::CallFrequencyMonitor;
use crate::resilience::timeouts::with_deadline;
use crate::resilience::{CircuitBreakerRegistry, KillSwitch};

/// Errors surfaced by a guarded call.
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub type GuardResult<T> = Result<T, GuardError>;

/// Composition root for breaker, cache and monitor state.
///
/// Every piece of state is owned by the instance; share it with `Arc` to
/// give several callers the same breakers and cache.
pub struct RequestGuard {
    transport: Arc<dyn HttpTransport>,
    breakers: CircuitBreakerRegistry,
    cache: Arc<ResponseCache>,
    monitor: CallFrequencyMonitor,
    kill_switch: KillSwitch,
    cache_config: ArcSwap<CacheConfig>,
}

impl RequestGuard {
    /// Guard backed by a default `reqwest` client.
    pub fn new(config: &GuardConfig) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(config: &GuardConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            breakers: CircuitBreakerRegistry::new(config.breaker.clone()),
            cache: Arc::new(ResponseCache::new()),
            monitor: CallFrequencyMonitor::new(config.monitor.clone()),
            kill_switch: KillSwitch::env_var(config.kill_switch.env_var.clone()),
            cache_config: ArcSwap::from_pointee(config.cache.clone()),
        }
    }

    /// Replace the kill switch, e.g. with [`KillSwitch::manual`].
    pub fn with_kill_switch(mut self, kill_switch: KillSwitch) -> Self {
        self.kill_switch = kill_switch;
        self
    }

    /// Apply new thresholds. Breaker records and cache entries are kept;
    /// the kill switch variable and sweep interval are fixed at construction.
    pub fn reload(&self, config: &GuardConfig) {
        self.breakers.update_config(config.breaker.clone());
        self.monitor.update_config(config.monitor.clone());
        self.cache_config.store(Arc::new(config.cache.clone()));
        tracing::info!("Guard configuration reloaded");
    }

    pub fn breakers(&self) -> &CircuitBreakerRegistry {
        &self.breakers
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn monitor(&self) -> &CallFrequencyMonitor {
        &self.monitor
    }

    pub fn kill_switch(&self) -> &KillSwitch {
        &self.kill_switch
    }

    /// Spawn the periodic cache sweep until `shutdown` fires.
    pub fn spawn_cache_sweeper(&self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        let interval = self.cache_config.load().sweep_interval();
        let sweeper = CacheSweeper::new(self.cache.clone(), interval);
        tokio::spawn(sweeper.run(shutdown))
    }

    /// Perform one guarded call.
    ///
    /// Returns `Ok(None)` when the call was not attempted because the kill
    /// switch is on or the endpoint's circuit is open.
    pub async fn fetch(
        &self,
        url: &str,
        options: &FetchOptions,
        config: &FetchConfig,
    ) -> GuardResult<Option<GuardedResponse>> {
        let url = Url::parse(url)?;

        if self.kill_switch.is_enabled() {
            tracing::debug!(url = %url, "Kill switch enabled, skipping request");
            metrics::record_call(CallOutcome::KillSwitch);
            return Ok(None);
        }

        let endpoint = url.as_str();
        self.monitor.record(endpoint);

        let key = (config.cache && options.is_cacheable()).then(|| cache_key(&url, options));
        if let Some(key) = &key {
            if let Some(data) = self.cache.get(key) {
                tracing::debug!(url = %url, "Serving response from cache");
                metrics::record_call(CallOutcome::CacheHit);
                return Ok(Some(GuardedResponse::from_cache(&data)));
            }
        }

        // Held across the network call; dropping the future records a failure.
        let attempt = if config.skip_circuit_breaker {
            None
        } else {
            match self.breakers.try_acquire(endpoint) {
                Some(attempt) => Some(attempt),
                None => {
                    tracing::debug!(url = %url, "Circuit open, skipping request");
                    metrics::record_call(CallOutcome::CircuitOpen);
                    return Ok(None);
                }
            }
        };

        let result = with_deadline(config.timeout, self.transport.send(&url, options)).await;
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                if let Some(attempt) = attempt {
                    attempt.finish(false);
                }
                tracing::warn!(url = %url, error = %e, "Request failed");
                metrics::record_call(CallOutcome::TransportError);
                return Err(e.into());
            }
        };

        let success = response.status.is_success();
        if let Some(attempt) = attempt {
            attempt.finish(success);
        }

        if success {
            metrics::record_call(CallOutcome::Success);
            if let Some(key) = key {
                self.store(key, &url, &response.body, config);
            }
        } else {
            tracing::debug!(url = %url, status = %response.status, "Non-success status");
            metrics::record_call(CallOutcome::HttpError);
        }

        Ok(Some(GuardedResponse::from_network(response)))
    }

    fn store(&self, key: String, url: &Url, body: &[u8], config: &FetchConfig) {
        match serde_json::from_slice::<Value>(body) {
            Ok(data) => {
                let ttl = config
                    .cache_ttl
                    .unwrap_or_else(|| self.cache_config.load().default_ttl());
                self.cache.insert(key, data, ttl);
            }
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Response body is not JSON, not caching");
            }
        }
    }
}

impl std::fmt::Debug for RequestGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestGuard")
            .field("breakers", &self.breakers.len())
            .field("cache_entries", &self.cache.len())
            .field("kill_switch", &self.kill_switch)
            .finish()
    }
}
