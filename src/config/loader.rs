//! Configuration Loader
//!
//! Environment-aware configuration loading built on the `config` crate.
//! Sources are layered lowest to highest precedence:
//!
//! 1. built-in defaults ([`ReminderConfig::default`])
//! 2. `{dir}/reminder.yaml`
//! 3. `{dir}/reminder.{environment}.yaml`
//! 4. `REMINDER__SECTION__KEY` environment variables
//! 5. well-known variables: `DATABASE_URL`, `LINE_CHANNEL_SECRET`,
//!    `LINE_CHANNEL_ACCESS_TOKEN`

use super::error::{ConfigResult, ConfigurationError};
use super::ReminderConfig;
use crate::constants::env as env_keys;
use config::{Config, Environment, File};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Loaded, validated configuration plus where it came from
#[derive(Debug)]
pub struct ConfigManager {
    config: ReminderConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);
        let config = Self::build(&config_directory, environment, true)?;
        Ok(Arc::new(Self::finish(config, environment, config_directory)))
    }

    /// Load only from defaults and files, ignoring process environment variables
    pub fn load_files_only(config_dir: &Path, environment: &str) -> ConfigResult<ConfigManager> {
        let config = Self::build(config_dir, environment, false)?;
        Ok(Self::finish(config, environment, config_dir.to_path_buf()))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &ReminderConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// Detect environment from `REMINDER_ENV`, then `APP_ENV`, default `development`
    pub fn detect_environment() -> String {
        env::var(env_keys::ENVIRONMENT)
            .or_else(|_| env::var(env_keys::FALLBACK_ENVIRONMENT))
            .unwrap_or_else(|_| "development".to_string())
    }

    fn default_config_directory() -> PathBuf {
        env::var(env_keys::CONFIG_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }

    fn build(
        config_dir: &Path,
        environment: &str,
        include_process_env: bool,
    ) -> ConfigResult<ReminderConfig> {
        debug!(
            "Loading configuration for environment '{}' from directory: {}",
            environment,
            config_dir.display()
        );

        let defaults = Config::try_from(&ReminderConfig::default())
            .map_err(|e| ConfigurationError::load_error(environment, e))?;

        let mut builder = Config::builder()
            .add_source(defaults)
            .add_source(File::from(config_dir.join("reminder.yaml")).required(false))
            .add_source(
                File::from(config_dir.join(format!("reminder.{environment}.yaml"))).required(false),
            )
            .set_override("environment", environment)
            .map_err(|e| ConfigurationError::load_error(environment, e))?;

        if include_process_env {
            builder = builder
                .add_source(
                    Environment::with_prefix(env_keys::PREFIX)
                        .prefix_separator("__")
                        .separator("__")
                        .try_parsing(true),
                )
                .set_override_option("database.url", env::var(env_keys::DATABASE_URL).ok())
                .and_then(|b| {
                    b.set_override_option(
                        "channel.channel_secret",
                        env::var(env_keys::CHANNEL_SECRET).ok(),
                    )
                })
                .and_then(|b| {
                    b.set_override_option(
                        "channel.access_token",
                        env::var(env_keys::CHANNEL_ACCESS_TOKEN).ok(),
                    )
                })
                .map_err(|e| ConfigurationError::load_error(environment, e))?;
        }

        let config: ReminderConfig = builder
            .build()
            .and_then(Config::try_deserialize)
            .map_err(|e| ConfigurationError::load_error(environment, e))?;

        config.validate()?;
        Ok(config)
    }

    fn finish(config: ReminderConfig, environment: &str, config_directory: PathBuf) -> Self {
        debug!(
            "Configuration loaded successfully: {}",
            serde_json::to_string_pretty(&config.sanitized())
                .unwrap_or_else(|_| "[serialization error]".to_string())
        );
        info!(
            environment = %environment,
            queue = %config.queue.name,
            offline_fallback = config.scheduler.enable_offline_fallback,
            "⚙️ Configuration loaded"
        );

        ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults_when_no_files_exist() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::load_files_only(dir.path(), "test").unwrap();
        assert_eq!(manager.environment(), "test");
        assert_eq!(manager.config().environment, "test");
        assert_eq!(manager.config().queue.name, "task_reminders");
    }

    #[test]
    fn test_environment_file_overrides_base_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("reminder.yaml"),
            "scheduler:\n  default_offset_minutes: 15\n  closing_phrase: \"Base phrase\"\nqueue:\n  name: base_queue\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("reminder.production.yaml"),
            "scheduler:\n  enable_offline_fallback: false\nqueue:\n  name: prod_reminders\n",
        )
        .unwrap();

        let manager = ConfigManager::load_files_only(dir.path(), "production").unwrap();
        let config = manager.config();
        assert_eq!(config.scheduler.default_offset_minutes, 15);
        assert_eq!(config.scheduler.closing_phrase, "Base phrase");
        assert!(!config.scheduler.enable_offline_fallback);
        assert_eq!(config.queue.name, "prod_reminders");
        assert_eq!(config.queue.poll_interval_ms, 1_000);
    }

    #[test]
    fn test_invalid_file_values_fail_validation() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("reminder.yaml"), "queue:\n  name: \"Not Valid\"\n").unwrap();
        let err = ConfigManager::load_files_only(dir.path(), "test").unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidValue { .. }));
    }

    #[test]
    fn test_malformed_yaml_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("reminder.yaml"), "queue: [unclosed\n").unwrap();
        let err = ConfigManager::load_files_only(dir.path(), "test").unwrap_err();
        assert!(matches!(err, ConfigurationError::LoadError { .. }));
    }
}
