//! Configuration validation rules.

use std::net::SocketAddr;

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

/// Upper bound for the expiry and cooldown windows (10 years).
pub const MAX_WINDOW_SECS: u64 = 10 * 365 * 24 * 60 * 60;

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `bind_addr` is not a socket address
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `max_concurrency` is outside 1..=64
    /// - `not_profile_expiry_secs` is 0
    /// - `not_profile_expiry_secs` or `profile_update_cooldown_secs` exceeds 10 years
    /// - `user_agent` is empty
    ///
    /// Returns `ConfigError::Missing` if `cors_origins` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_addr.parse::<SocketAddr>().is_err() {
            return Err(invalid("bind_addr", "must be a socket address like 127.0.0.1:3000"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if !(1..=64).contains(&self.max_concurrency) {
            return Err(invalid("max_concurrency", "must be between 1 and 64"));
        }

        if self.not_profile_expiry_secs == 0 {
            return Err(invalid("not_profile_expiry_secs", "must be greater than 0"));
        }
        if self.not_profile_expiry_secs > MAX_WINDOW_SECS {
            return Err(invalid("not_profile_expiry_secs", "must not exceed 10 years"));
        }
        if self.profile_update_cooldown_secs > MAX_WINDOW_SECS {
            return Err(invalid("profile_update_cooldown_secs", "must not exceed 10 years"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.cors_origins.is_empty() {
            return Err(ConfigError::Missing {
                field: "cors_origins".into(),
                hint: "use [\"*\"] to allow any origin".into(),
            });
        }

        if self.allow_private_hosts {
            tracing::warn!("allow_private_hosts is set; SSRF protection is disabled");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_bind_addr() {
        let config = AppConfig { bind_addr: "localhost".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "bind_addr"));
    }

    #[test]
    fn test_validate_max_bytes_zero() {
        let config = AppConfig { max_bytes: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_bytes"));
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));

        let config = AppConfig { timeout_ms: 301_000, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_concurrency_bounds() {
        let config = AppConfig { max_concurrency: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "max_concurrency"));

        let config = AppConfig { max_concurrency: 65, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "max_concurrency"));
    }

    #[test]
    fn test_validate_zero_expiry() {
        let config = AppConfig { not_profile_expiry_secs: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "not_profile_expiry_secs"));
    }

    #[test]
    fn test_validate_zero_cooldown_allowed() {
        let config = AppConfig { profile_update_cooldown_secs: 0, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_window_caps() {
        let config = AppConfig { not_profile_expiry_secs: 1_000_000_000_000_000, ..Default::default() };
        assert!(
            matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "not_profile_expiry_secs")
        );

        let config = AppConfig { profile_update_cooldown_secs: u64::MAX, ..Default::default() };
        assert!(
            matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "profile_update_cooldown_secs")
        );

        let config = AppConfig {
            not_profile_expiry_secs: MAX_WINDOW_SECS,
            profile_update_cooldown_secs: MAX_WINDOW_SECS,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig { user_agent: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "user_agent"));
    }

    #[test]
    fn test_validate_empty_cors_origins() {
        let config = AppConfig { cors_origins: Vec::new(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn test_validate_edge_case_values() {
        let config = AppConfig { max_bytes: 1, timeout_ms: 100, max_concurrency: 1, ..Default::default() };
        assert!(config.validate().is_ok());
    }
}
