//! Periodic eviction of expired cache entries.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::cache::store::ResponseCache;

/// Background task that sweeps a [`ResponseCache`] on a fixed interval.
pub struct CacheSweeper {
    cache: Arc<ResponseCache>,
    interval: Duration,
}

impl CacheSweeper {
    pub fn new(cache: Arc<ResponseCache>, interval: Duration) -> Self {
        Self { cache, interval }
    }

    /// Sweep until a shutdown signal arrives or its sender is dropped.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_ms = self.interval.as_millis() as u64, "Cache sweeper starting");

        let mut ticker = time::interval_at(time::Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = self.cache.sweep();
                    tracing::debug!(evicted, remaining = self.cache.len(), "Cache sweep complete");
                }
                _ = shutdown.recv() => {
                    tracing::info!("Cache sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn test_sweeps_on_interval_and_stops_on_shutdown() {
        let cache = Arc::new(ResponseCache::new());
        cache.insert("a", json!(1), Duration::from_millis(10));
        cache.insert("b", json!(2), Duration::from_secs(3600));

        let shutdown = Shutdown::new();
        let sweeper = CacheSweeper::new(cache.clone(), Duration::from_millis(100));
        let handle = tokio::spawn(sweeper.run(shutdown.subscribe()));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(cache.len(), 1);

        shutdown.trigger();
        handle.await.unwrap();
    }
}
