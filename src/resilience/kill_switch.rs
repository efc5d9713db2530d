//! Process-wide kill switch for guarded calls.
//!
//! The environment variant is re-read on every check so it can be flipped
//! at runtime.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum KillSwitch {
    /// Enabled while the named variable equals `"true"`.
    Env(String),
    /// In-process toggle.
    Manual(Arc<AtomicBool>),
}

impl KillSwitch {
    pub fn from_env() -> Self {
        Self::Env("DISABLE_POLLING".to_string())
    }

    pub fn env_var(name: impl Into<String>) -> Self {
        Self::Env(name.into())
    }

    pub fn manual() -> Self {
        Self::Manual(Arc::new(AtomicBool::new(false)))
    }

    pub fn is_enabled(&self) -> bool {
        match self {
            KillSwitch::Env(name) => std::env::var(name).map(|v| v == "true").unwrap_or(false),
            KillSwitch::Manual(flag) => flag.load(Ordering::Relaxed),
        }
    }

    /// Flip a manual switch. No effect on the environment variant.
    pub fn set(&self, enabled: bool) {
        match self {
            KillSwitch::Env(name) => {
                tracing::warn!(var = %name, "Cannot toggle an environment kill switch in-process");
            }
            KillSwitch::Manual(flag) => flag.store(enabled, Ordering::Relaxed),
        }
    }
}

impl Default for KillSwitch {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_switch_reads_every_time() {
        // Unique name so parallel tests never share it.
        let name = "REQUEST_GUARD_TEST_KILL_SWITCH_ENV";
        let switch = KillSwitch::env_var(name);

        std::env::remove_var(name);
        assert!(!switch.is_enabled());

        std::env::set_var(name, "true");
        assert!(switch.is_enabled());

        std::env::set_var(name, "1");
        assert!(!switch.is_enabled());

        std::env::remove_var(name);
    }

    #[test]
    fn test_manual_switch_is_shared_between_clones() {
        let switch = KillSwitch::manual();
        let clone = switch.clone();

        clone.set(true);
        assert!(switch.is_enabled());
        clone.set(false);
        assert!(!switch.is_enabled());
    }
}
