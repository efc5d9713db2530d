//! Configuration file watcher for hot reload.
//!
//! The parent directory is watched rather than the file itself, so editors
//! that save by writing a new file and renaming it over the old one keep
//! triggering reloads. Events for other files in that directory are ignored.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::GuardConfig;

/// Watches the configuration file and emits validated configs on change.
pub struct ConfigWatcher {
    handler: ReloadHandler,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<GuardConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                handler: ReloadHandler::new(path, update_tx),
            },
            update_rx,
        )
    }

    /// Start watching. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let dir = self.handler.watch_dir();
        let handler = self.handler;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| handler.on_event(res),
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(dir = ?dir, "Config watcher started");
        Ok(watcher)
    }
}

/// Turns file events into validated, de-duplicated config updates.
struct ReloadHandler {
    path: PathBuf,
    file_name: Option<OsString>,
    update_tx: mpsc::UnboundedSender<GuardConfig>,
    last_sent: Mutex<Option<GuardConfig>>,
}

impl ReloadHandler {
    fn new(path: &Path, update_tx: mpsc::UnboundedSender<GuardConfig>) -> Self {
        Self {
            path: path.to_path_buf(),
            file_name: path.file_name().map(|n| n.to_os_string()),
            update_tx,
            last_sent: Mutex::new(None),
        }
    }

    fn watch_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn on_event(&self, res: notify::Result<Event>) {
        match res {
            Ok(event) => {
                if (event.kind.is_modify() || event.kind.is_create()) && self.concerns(&event) {
                    self.reload();
                }
            }
            Err(e) => tracing::error!(error = ?e, "Config watch error"),
        }
    }

    fn concerns(&self, event: &Event) -> bool {
        event.paths.is_empty()
            || event
                .paths
                .iter()
                .any(|p| p.file_name().map(|n| n.to_os_string()) == self.file_name)
    }

    /// Load the file and send it if it differs from the last config sent.
    /// Returns whether an update was sent.
    fn reload(&self) -> bool {
        let config = match load_config(&self.path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(
                    path = ?self.path,
                    error = %e,
                    "Failed to reload config, keeping current configuration"
                );
                return false;
            }
        };

        let mut last = self.last_sent.lock().expect("config watcher mutex poisoned");
        if last.as_ref() == Some(&config) {
            tracing::debug!(path = ?self.path, "Config unchanged, skipping reload");
            return false;
        }

        tracing::info!(path = ?self.path, "Config file changed, reloading");
        if self.update_tx.send(config.clone()).is_err() {
            return false;
        }
        *last = Some(config);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, EventKind, ModifyKind};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "request-guard-watcher-{}-{}",
            std::process::id(),
            name
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_reload_sends_only_changed_valid_configs() {
        let dir = scratch_dir("handler");
        let path = dir.join("guard.toml");
        std::fs::write(&path, "[breaker]\nfailure_threshold = 5\n").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let handler = ReloadHandler::new(&path, tx);

        assert!(handler.reload());
        assert_eq!(rx.try_recv().unwrap().breaker.failure_threshold, 5);

        // Same content twice, as editors often emit several modify events.
        assert!(!handler.reload());
        assert!(rx.try_recv().is_err());

        std::fs::write(&path, "[breaker]\nfailure_threshold = 0\n").unwrap();
        assert!(!handler.reload(), "invalid config is never sent");
        assert!(rx.try_recv().is_err());

        std::fs::write(&path, "[breaker]\nfailure_threshold = 7\n").unwrap();
        assert!(handler.reload());
        assert_eq!(rx.try_recv().unwrap().breaker.failure_threshold, 7);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_events_for_other_files_are_ignored() {
        let dir = scratch_dir("filter");
        let path = dir.join("guard.toml");
        std::fs::write(&path, "").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let handler = ReloadHandler::new(&path, tx);

        let other = Event::new(EventKind::Modify(ModifyKind::Any)).add_path(dir.join("notes.txt"));
        handler.on_event(Ok(other));
        assert!(rx.try_recv().is_err());

        let ours = Event::new(EventKind::Create(CreateKind::File)).add_path(path.clone());
        handler.on_event(Ok(ours));
        assert_eq!(rx.try_recv().unwrap(), GuardConfig::default());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_bare_file_name_watches_current_dir() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let handler = ReloadHandler::new(Path::new("guard.toml"), tx);
        assert_eq!(handler.watch_dir(), PathBuf::from("."));
    }

    #[tokio::test]
    async fn test_watcher_delivers_file_changes() {
        let dir = scratch_dir("live");
        let path = dir.join("guard.toml");
        std::fs::write(&path, "").unwrap();

        let (watcher, mut updates) = ConfigWatcher::new(&path);
        let _watcher = watcher.run().unwrap();

        // Rewrite until the new value lands; watch registration is asynchronous
        // and a read racing the write may see the truncated file first.
        let mut received = None;
        'outer: for attempt in 0..20u32 {
            let content = format!("[monitor]\nmax_calls_per_window = {}\n", 100 + attempt);
            std::fs::write(&path, content).unwrap();
            while let Ok(Some(config)) =
                tokio::time::timeout(Duration::from_millis(500), updates.recv()).await
            {
                if config.monitor.max_calls_per_window >= 100 {
                    received = Some(config);
                    break 'outer;
                }
            }
        }

        assert!(received.is_some(), "watcher should report the rewritten file");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
