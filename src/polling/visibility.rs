//! Visibility-aware fixed-interval polling.
//!
//! [`PageVisibility`] is the host's foreground/background signal. A poller
//! created from it only ticks while the signal reads `Visible`.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Shared visibility signal. Clones observe and drive the same state.
#[derive(Debug, Clone)]
pub struct PageVisibility {
    tx: Arc<watch::Sender<Visibility>>,
}

impl PageVisibility {
    pub fn new(initial: Visibility) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn set(&self, visibility: Visibility) {
        let previous = self.tx.send_replace(visibility);
        if previous != visibility {
            tracing::debug!(?visibility, "Visibility changed");
        }
    }

    pub fn set_visible(&self) {
        self.set(Visibility::Visible);
    }

    pub fn set_hidden(&self) {
        self.set(Visibility::Hidden);
    }

    pub fn current(&self) -> Visibility {
        *self.tx.borrow()
    }

    pub fn is_visible(&self) -> bool {
        self.current() == Visibility::Visible
    }

    pub fn subscribe(&self) -> watch::Receiver<Visibility> {
        self.tx.subscribe()
    }
}

impl Default for PageVisibility {
    fn default() -> Self {
        Self::new(Visibility::Visible)
    }
}

type PollFn = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;
type SharedTimer = Arc<Mutex<TimerSlot>>;

/// Interval timer state. `Closed` is terminal so a listener racing cleanup
/// cannot start a timer nobody will stop.
#[derive(Debug, Default)]
enum TimerSlot {
    #[default]
    Idle,
    Running(JoinHandle<()>),
    Closed,
}

/// Handle for a running visibility-aware poller.
///
/// [`cleanup`](Self::cleanup) (or dropping the handle) stops the timer and
/// stops listening for visibility changes.
pub struct VisibilityPoller {
    timer: SharedTimer,
    listener: Option<JoinHandle<()>>,
}

impl VisibilityPoller {
    /// Whether the interval timer is currently running.
    pub fn is_polling(&self) -> bool {
        matches!(
            &*self.timer.lock().expect("visibility timer mutex poisoned"),
            TimerSlot::Running(handle) if !handle.is_finished()
        )
    }

    pub fn cleanup(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
            close_timer(&self.timer);
            tracing::debug!("Visibility-aware poller cleaned up");
        }
    }
}

impl Drop for VisibilityPoller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Run `poll_fn` every `interval` while `visibility` is visible.
///
/// The first tick comes one `interval` after the timer starts. Must be
/// called inside a Tokio runtime.
pub fn create_visibility_aware_poller<F, Fut>(
    poll_fn: F,
    interval: Duration,
    visibility: &PageVisibility,
) -> VisibilityPoller
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let poll_fn: PollFn = Arc::new(move || poll_fn().boxed());
    let timer: SharedTimer = Arc::default();
    let mut rx = visibility.subscribe();

    if *rx.borrow_and_update() == Visibility::Visible {
        start_timer(&timer, &poll_fn, interval);
    }

    let listener = tokio::spawn({
        let timer = timer.clone();
        async move {
            while rx.changed().await.is_ok() {
                let visibility = *rx.borrow_and_update();
                match visibility {
                    Visibility::Visible => start_timer(&timer, &poll_fn, interval),
                    Visibility::Hidden => stop_timer(&timer),
                }
            }
        }
    });

    VisibilityPoller {
        timer,
        listener: Some(listener),
    }
}

fn start_timer(timer: &SharedTimer, poll_fn: &PollFn, interval: Duration) {
    let mut slot = timer.lock().expect("visibility timer mutex poisoned");
    match &*slot {
        TimerSlot::Closed => return,
        TimerSlot::Running(handle) if !handle.is_finished() => return,
        _ => {}
    }

    let poll_fn = poll_fn.clone();
    *slot = TimerSlot::Running(tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            (poll_fn)().await;
        }
    }));
}

fn stop_timer(timer: &SharedTimer) {
    let mut slot = timer.lock().expect("visibility timer mutex poisoned");
    if matches!(*slot, TimerSlot::Running(_)) {
        if let TimerSlot::Running(handle) = std::mem::replace(&mut *slot, TimerSlot::Idle) {
            handle.abort();
        }
    }
}

fn close_timer(timer: &SharedTimer) {
    let previous = std::mem::replace(
        &mut *timer.lock().expect("visibility timer mutex poisoned"),
        TimerSlot::Closed,
    );
    if let TimerSlot::Running(handle) = previous {
        handle.abort();
    }
}
