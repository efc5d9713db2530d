//! Trailing-edge debounce.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Coalesces bursts of calls into one invocation `delay` after the last call.
///
/// Each [`call`](Self::call) restarts the timer; only the last argument is
/// delivered. A pending invocation still fires if the debouncer is dropped;
/// use [`cancel`](Self::cancel) to discard it.
pub struct Debouncer<T> {
    func: Arc<dyn Fn(T) + Send + Sync>,
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F>(func: F, delay: Duration) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Schedule `func(arg)`, replacing any pending invocation.
    /// Must be called inside a Tokio runtime.
    pub fn call(&self, arg: T) {
        let mut pending = self.pending.lock().expect("debounce mutex poisoned");
        if let Some(previous) = pending.take() {
            previous.abort();
        }

        let func = self.func.clone();
        let delay = self.delay;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            func(arg);
        }));
    }

    pub fn cancel(&self) {
        if let Some(previous) = self.pending.lock().expect("debounce mutex poisoned").take() {
            previous.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .expect("debounce mutex poisoned")
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

/// Shorthand for [`Debouncer::new`].
pub fn debounce<T, F>(func: F, delay: Duration) -> Debouncer<T>
where
    T: Send + 'static,
    F: Fn(T) + Send + Sync + 'static,
{
    Debouncer::new(func, delay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_burst_fires_once_after_last_call() {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let sink = fired.clone();
        let debounced = debounce(move |n: u32| sink.lock().unwrap().push(n), Duration::from_millis(200));

        for n in 0..5 {
            debounced.call(n);
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        // Last call at t=200, so the invocation is due at t=400.
        tokio::time::sleep(Duration::from_millis(149)).await;
        assert!(fired.lock().unwrap().is_empty());
        assert!(debounced.is_pending());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(*fired.lock().unwrap(), vec![4]);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(fired.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_calls_each_fire() {
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();
        let debounced = debounce(
            move |_: ()| {
                c.fetch_add(1, Ordering::SeqCst);
            },
            Duration::from_millis(100),
        );

        debounced.call(());
        tokio::time::sleep(Duration::from_millis(150)).await;
        debounced.call(());
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_pending() {
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();
        let debounced = debounce(
            move |_: ()| {
                c.fetch_add(1, Ordering::SeqCst);
            },
            Duration::from_millis(100),
        );

        debounced.call(());
        debounced.cancel();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!debounced.is_pending());
    }
}
