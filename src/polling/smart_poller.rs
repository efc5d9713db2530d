//! Exponential-backoff poller.
//!
//! # Lifecycle
//! ```text
//! stopped --start()--> active --stop()--> stopped
//! ```
//! `start()` polls immediately, then waits `current_interval` between runs.
//! `stop()` cancels the pending wait. A poll already in flight is not
//! cancelled, but when it completes it sees the stop and schedules nothing.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::{BackoffPolicy, PollerConfig};
use crate::observability::metrics;
use crate::resilience::backoff::next_interval;

type PollFn = Arc<dyn Fn() -> BoxFuture<'static, Result<(), String>> + Send + Sync>;

/// Floor for the base interval; zero would never back off.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy)]
struct Schedule {
    base: Duration,
    max: Duration,
    policy: BackoffPolicy,
}

#[derive(Debug)]
struct PollerState {
    current_interval: Duration,
    failure_count: u32,
}

impl PollerState {
    fn record(&mut self, success: bool, schedule: &Schedule) -> Duration {
        if success {
            self.current_interval = schedule.base;
            self.failure_count = 0;
        } else {
            self.failure_count = self.failure_count.saturating_add(1);
            self.current_interval = next_interval(
                schedule.policy,
                self.current_interval,
                schedule.base,
                self.failure_count,
                schedule.max,
            );
        }
        self.current_interval
    }
}

struct ActiveRun {
    stop_tx: watch::Sender<bool>,
    state: Arc<Mutex<PollerState>>,
    _task: JoinHandle<()>,
}

/// Repeatedly runs an async operation, backing off while it fails.
pub struct SmartPoller {
    poll_fn: PollFn,
    schedule: Schedule,
    run: Option<ActiveRun>,
}

impl SmartPoller {
    /// Poller with a 300 s cap and the compounding policy. A zero
    /// `base_interval` is raised to 1 ms.
    pub fn new<F, Fut, T, E>(fetch: F, base_interval: Duration) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let poll_fn: PollFn = Arc::new(move || {
            let fut = fetch();
            async move { fut.await.map(|_| ()).map_err(|e| e.to_string()) }.boxed()
        });
        let defaults = PollerConfig::default();
        if base_interval < MIN_INTERVAL {
            tracing::warn!(
                base_interval_ms = base_interval.as_millis() as u64,
                "Poll interval below minimum, using 1ms"
            );
        }
        let base_interval = base_interval.max(MIN_INTERVAL);

        Self {
            poll_fn,
            schedule: Schedule {
                base: base_interval,
                max: defaults.max_interval(),
                policy: defaults.backoff_policy,
            },
            run: None,
        }
    }

    pub fn from_config<F, Fut, T, E>(fetch: F, config: &PollerConfig) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        Self::new(fetch, config.base_interval())
            .with_max_interval(config.max_interval())
            .with_policy(config.backoff_policy)
    }

    /// Cap for the backed-off interval; never below the base interval.
    pub fn with_max_interval(mut self, max: Duration) -> Self {
        self.schedule.max = max.max(self.schedule.base);
        self
    }

    pub fn with_policy(mut self, policy: BackoffPolicy) -> Self {
        self.schedule.policy = policy;
        self
    }

    /// Begin polling. Must be called inside a Tokio runtime. No-op if active.
    pub fn start(&mut self) {
        if self.is_active() {
            tracing::debug!("Poller already active");
            return;
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let state = Arc::new(Mutex::new(PollerState {
            current_interval: self.schedule.base,
            failure_count: 0,
        }));
        let task = tokio::spawn(run_loop(
            self.poll_fn.clone(),
            self.schedule,
            state.clone(),
            stop_rx,
        ));

        tracing::debug!(base_interval_ms = self.schedule.base.as_millis() as u64, "Poller started");
        self.run = Some(ActiveRun {
            stop_tx,
            state,
            _task: task,
        });
    }

    /// Stop scheduling polls. Does not abort a poll in flight.
    pub fn stop(&mut self) {
        if let Some(run) = self.run.take() {
            let _ = run.stop_tx.send(true);
            tracing::debug!("Poller stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.run.is_some()
    }

    /// Wait before the next poll; the base interval while stopped.
    pub fn current_interval(&self) -> Duration {
        self.run
            .as_ref()
            .map(|run| run.state.lock().expect("poller state mutex poisoned").current_interval)
            .unwrap_or(self.schedule.base)
    }

    /// Consecutive failures in the current run; zero while stopped.
    pub fn failure_count(&self) -> u32 {
        self.run
            .as_ref()
            .map(|run| run.state.lock().expect("poller state mutex poisoned").failure_count)
            .unwrap_or(0)
    }
}

impl Drop for SmartPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_loop(
    poll_fn: PollFn,
    schedule: Schedule,
    state: Arc<Mutex<PollerState>>,
    mut stop_rx: watch::Receiver<bool>,
) {
    loop {
        if *stop_rx.borrow() {
            break;
        }

        let outcome = (poll_fn)().await;

        // A stop during the poll means no next cycle.
        if *stop_rx.borrow() {
            break;
        }

        metrics::record_poll(outcome.is_ok());
        let delay = {
            let mut state = state.lock().expect("poller state mutex poisoned");
            let delay = state.record(outcome.is_ok(), &schedule);
            if let Err(e) = &outcome {
                tracing::warn!(
                    error = %e,
                    failures = state.failure_count,
                    next_poll_ms = delay.as_millis() as u64,
                    "Poll failed, backing off"
                );
            }
            delay
        };

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = stop_rx.changed() => break,
        }
    }
}
