//! Configuration validation.
//!
//! Serde handles syntax; this checks value ranges. Every problem is
//! reported, not just the first.

use std::fmt;

use crate::config::schema::GuardConfig;

/// A single semantic problem with a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, returning all errors found.
pub fn validate_config(config: &GuardConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.breaker.failure_threshold == 0 {
        errors.push(ValidationError::new("breaker.failure_threshold", "must be at least 1"));
    }
    if config.breaker.reset_timeout_ms == 0 {
        errors.push(ValidationError::new("breaker.reset_timeout_ms", "must be greater than 0"));
    }
    if config.breaker.half_open_max_calls == 0 {
        errors.push(ValidationError::new("breaker.half_open_max_calls", "must be at least 1"));
    }

    if config.cache.default_ttl_ms == 0 {
        errors.push(ValidationError::new("cache.default_ttl_ms", "must be greater than 0"));
    }
    if config.cache.sweep_interval_ms == 0 {
        errors.push(ValidationError::new("cache.sweep_interval_ms", "must be greater than 0"));
    }

    if config.monitor.window_secs == 0 {
        errors.push(ValidationError::new("monitor.window_secs", "must be greater than 0"));
    }

    if config.poller.base_interval_ms == 0 {
        errors.push(ValidationError::new("poller.base_interval_ms", "must be greater than 0"));
    }
    if config.poller.max_interval_ms < config.poller.base_interval_ms {
        errors.push(ValidationError::new(
            "poller.max_interval_ms",
            format!(
                "must be >= base_interval_ms ({})",
                config.poller.base_interval_ms
            ),
        ));
    }

    if config.kill_switch.env_var.trim().is_empty() {
        errors.push(ValidationError::new("kill_switch.env_var", "must not be empty"));
    }

    if config.observability.log_level.parse::<tracing::Level>().is_err() {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GuardConfig::default()).is_ok());
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = GuardConfig::default();
        config.breaker.failure_threshold = 0;
        config.poller.base_interval_ms = 10_000;
        config.poller.max_interval_ms = 1_000;
        config.observability.log_level = "loud".to_string();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "breaker.failure_threshold",
                "poller.max_interval_ms",
                "observability.log_level",
            ]
        );
    }
}
