//! Application configuration with layered loading.
//!
//! Configuration is loaded with figment from, in order of precedence:
//!
//! 1. Environment variables (RELME_*)
//! 2. TOML config file (if RELME_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::freshness::FreshnessPolicy;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Socket address the HTTP server binds to.
    ///
    /// Set via RELME_BIND_ADDR environment variable.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Path to SQLite database holding the href store.
    ///
    /// Set via RELME_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for outbound HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to read per response.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of WebFinger lookups in flight per resolve call.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Seconds after which a `notProfile` record is swept.
    ///
    /// Set via RELME_NOT_PROFILE_EXPIRY_SECS environment variable.
    #[serde(default = "default_not_profile_expiry_secs")]
    pub not_profile_expiry_secs: u64,

    /// Minimum seconds between two refreshes of the same profile.
    ///
    /// Set via RELME_PROFILE_UPDATE_COOLDOWN_SECS environment variable.
    #[serde(default = "default_profile_update_cooldown_secs")]
    pub profile_update_cooldown_secs: u64,

    /// Allow fetching loopback and private-network hosts.
    ///
    /// Off in production; local development and tests turn it on.
    #[serde(default)]
    pub allow_private_hosts: bool,

    /// Origins allowed by CORS. `"*"` allows any origin.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_bind_addr() -> String {
    "127.0.0.1:3000".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./relme-cache.sqlite")
}

fn default_user_agent() -> String {
    "relme/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_concurrency() -> usize {
    8
}

fn default_not_profile_expiry_secs() -> u64 {
    24 * 60 * 60
}

fn default_profile_update_cooldown_secs() -> u64 {
    60 * 60
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            max_concurrency: default_max_concurrency(),
            not_profile_expiry_secs: default_not_profile_expiry_secs(),
            profile_update_cooldown_secs: default_profile_update_cooldown_secs(),
            allow_private_hosts: false,
            cors_origins: default_cors_origins(),
        }
    }
}

/// Seconds as a chrono duration, saturating at [`validation::MAX_WINDOW_SECS`].
fn window(secs: u64) -> chrono::Duration {
    i64::try_from(secs.min(validation::MAX_WINDOW_SECS))
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or(chrono::Duration::MAX)
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Expiry and cooldown windows for the profile cache.
    pub fn freshness_policy(&self) -> FreshnessPolicy {
        FreshnessPolicy {
            not_profile_expiry: window(self.not_profile_expiry_secs),
            update_cooldown: window(self.profile_update_cooldown_secs),
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config file or environment cannot be
    /// parsed, or if validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// Build the layered figment without extracting it.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("RELME_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment.merge(
            Env::prefixed("RELME_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }

    fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.bind_addr, "127.0.0.1:3000");
        assert_eq!(config.db_path, PathBuf::from("./relme-cache.sqlite"));
        assert_eq!(config.user_agent, "relme/0.1");
        assert_eq!(config.max_bytes, 5_242_880);
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.max_concurrency, 8);
        assert!(!config.allow_private_hosts);
        assert_eq!(config.cors_origins, vec!["*".to_string()]);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_freshness_policy_from_config() {
        let config = AppConfig { not_profile_expiry_secs: 60, profile_update_cooldown_secs: 5, ..Default::default() };
        let policy = config.freshness_policy();
        assert_eq!(policy.not_profile_expiry, chrono::Duration::seconds(60));
        assert_eq!(policy.update_cooldown, chrono::Duration::seconds(5));
    }

    #[test]
    fn test_freshness_policy_saturates_oversized_windows() {
        let config = AppConfig { not_profile_expiry_secs: u64::MAX, profile_update_cooldown_secs: u64::MAX, ..Default::default() };
        let policy = config.freshness_policy();
        let cap = chrono::Duration::seconds(validation::MAX_WINDOW_SECS as i64);
        assert_eq!(policy.not_profile_expiry, cap);
        assert_eq!(policy.update_cooldown, cap);
    }

    #[test]
    fn test_load_env_overrides() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("RELME_TIMEOUT_MS", "5000");
            jail.set_env("RELME_ALLOW_PRIVATE_HOSTS", "true");
            let config = AppConfig::load().expect("config loads");
            assert_eq!(config.timeout_ms, 5000);
            assert!(config.allow_private_hosts);
            Ok(())
        });
    }

    #[test]
    fn test_load_toml_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("relme.toml", "user_agent = \"relme-test/1\"\nmax_concurrency = 2\n")?;
            jail.set_env("RELME_CONFIG_FILE", "relme.toml");
            let config = AppConfig::load().expect("config loads");
            assert_eq!(config.user_agent, "relme-test/1");
            assert_eq!(config.max_concurrency, 2);
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("RELME_MAX_CONCURRENCY", "0");
            assert!(matches!(AppConfig::load(), Err(ConfigError::Invalid { .. })));
            Ok(())
        });
    }
}
