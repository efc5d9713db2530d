//! Call-frequency monitor.
//!
//! Counts guarded calls in a rolling window and warns when a caller is
//! issuing requests faster than expected. Purely diagnostic: it never
//! blocks a call.

use arc_swap::ArcSwap;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

use crate::config::MonitorConfig;

struct CallWindow {
    started: Instant,
    calls: u32,
}

/// Rolling-window call counter shared by every call through a guard.
pub struct CallFrequencyMonitor {
    window: Mutex<CallWindow>,
    config: ArcSwap<MonitorConfig>,
}

impl CallFrequencyMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            window: Mutex::new(CallWindow {
                started: Instant::now(),
                calls: 0,
            }),
            config: ArcSwap::from_pointee(config),
        }
    }

    pub fn update_config(&self, config: MonitorConfig) {
        self.config.store(Arc::new(config));
    }

    /// Record one call for `endpoint`.
    ///
    /// Returns true when this call pushed the window over the ceiling, in
    /// which case a warning was logged and the window restarted.
    pub fn record(&self, endpoint: &str) -> bool {
        let config = self.config.load();
        let now = Instant::now();
        let mut window = self.window.lock().expect("call window mutex poisoned");

        if now.duration_since(window.started) > config.window() {
            window.started = now;
            window.calls = 0;
        }
        window.calls += 1;

        if window.calls > config.max_calls_per_window {
            tracing::warn!(
                endpoint = %endpoint,
                calls = window.calls,
                window_secs = config.window_secs,
                "High request frequency detected"
            );
            window.started = now;
            window.calls = 0;
            return true;
        }
        false
    }

    /// Calls counted in the current window.
    pub fn current_calls(&self) -> u32 {
        self.window.lock().expect("call window mutex poisoned").calls
    }
}

impl Default for CallFrequencyMonitor {
    fn default() -> Self {
        Self::new(MonitorConfig::default())
    }
}
