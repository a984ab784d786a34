use crate::{
    BackupConfig, CONFIG_DIR_ENV, CONFIG_FILE_NAME, ConfigError, ConfigErrorResult,
    DEFAULT_CONFIG_DIR, DeleteConfig, LoggingConfig, PlatformConfig,
};

use std::path::PathBuf;

use log::info;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub platform: PlatformConfig,
    pub logging: LoggingConfig,
    pub backup: BackupConfig,
    pub delete: DeleteConfig,
}

impl Config {
    /// Load config.
    ///
    /// Loading order:
    /// 1. Check for BI_CONFIG_DIR env var, else use ./.bi-admin/
    /// 2. Auto-create config directory if it doesn't exist
    /// 3. Load config.toml if it exists, else use defaults
    /// 4. Apply BI_* environment variable overrides
    ///
    /// Does NOT validate - call validate() after load().
    pub fn load() -> ConfigErrorResult<Self> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::Io {
                path: config_dir.clone(),
                source: e,
            })?;
        }

        let config_path = config_dir.join(CONFIG_FILE_NAME);

        let mut config = if config_path.exists() {
            Self::load_toml(&config_path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    fn load_toml(path: &PathBuf) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.clone(),
            source: e,
        })
    }

    /// Get the config directory.
    /// Priority: BI_CONFIG_DIR env var > ./.bi-admin/ (relative to cwd)
    pub fn config_dir() -> ConfigErrorResult<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        let cwd = std::env::current_dir()
            .map_err(|_| ConfigError::config("Cannot determine current working directory"))?;
        Ok(cwd.join(DEFAULT_CONFIG_DIR))
    }

    /// Validate all configuration.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.platform.validate()?;
        self.backup.validate()?;
        self.delete.validate()?;
        Ok(())
    }

    /// Log configuration summary (NEVER logs secrets).
    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!(
            "  platform: {} (timeout {}s, token: {})",
            self.platform.url,
            self.platform.timeout_secs,
            if self.platform.access_token.is_some() {
                "set"
            } else {
                "none"
            }
        );
        info!(
            "  logging: {} (colored: {})",
            *self.logging.level, self.logging.colored
        );
        info!(
            "  backup: {} (prefix: {})",
            self.backup.directory().display(),
            self.backup.prefix
        );
        info!(
            "  delete: shared_check_batch_size={}",
            self.delete.shared_check_batch_size
        );
    }

    fn apply_env_overrides(&mut self) {
        // Platform
        Self::apply_env_string("BI_PLATFORM_URL", &mut self.platform.url);
        Self::apply_env_option_string("BI_ACCESS_TOKEN", &mut self.platform.access_token);
        Self::apply_env_parse("BI_TIMEOUT_SECS", &mut self.platform.timeout_secs);

        // Logging
        Self::apply_env_parse("BI_LOG_LEVEL", &mut self.logging.level);
        Self::apply_env_bool("BI_LOG_COLORED", &mut self.logging.colored);
        Self::apply_env_option_string("BI_LOG_FILE", &mut self.logging.file);

        // Backup
        Self::apply_env_option_string("BI_BACKUP_DIR", &mut self.backup.dir);
        Self::apply_env_string("BI_BACKUP_PREFIX", &mut self.backup.prefix);

        // Delete
        Self::apply_env_parse(
            "BI_SHARED_CHECK_BATCH_SIZE",
            &mut self.delete.shared_check_batch_size,
        );
    }

    /// Helper: Apply environment variable override for String values
    fn apply_env_string(var_name: &str, target: &mut String) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val;
        }
    }

    /// Helper: Apply environment variable override for bool values (accepts "true"/"1")
    fn apply_env_bool(var_name: &str, target: &mut bool) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val == "true" || val == "1";
        }
    }

    /// Helper: Apply environment variable override for parseable values
    fn apply_env_parse<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(val) = std::env::var(var_name)
            && let Ok(parsed) = val.parse()
        {
            *target = parsed;
        }
    }

    /// Helper: Apply environment variable override for Option<String> values
    fn apply_env_option_string(var_name: &str, target: &mut Option<String>) {
        if let Ok(val) = std::env::var(var_name) {
            *target = Some(val);
        }
    }
}
