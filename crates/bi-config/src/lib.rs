mod backup_config;
mod config;
mod delete_config;
mod error;
mod log_level;
mod logging_config;
mod platform_config;

#[cfg(test)]
mod tests;

pub use backup_config::BackupConfig;
pub use config::Config;
pub use delete_config::DeleteConfig;
pub use error::{ConfigError, ConfigErrorResult};
pub use log_level::LogLevel;
pub use logging_config::LoggingConfig;
pub use platform_config::PlatformConfig;

const CONFIG_DIR_ENV: &str = "BI_CONFIG_DIR";
const DEFAULT_CONFIG_DIR: &str = ".bi-admin";
const CONFIG_FILE_NAME: &str = "config.toml";

const DEFAULT_PLATFORM_URL: &str = "http://localhost:8088";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const MIN_TIMEOUT_SECS: u64 = 1;
const MAX_TIMEOUT_SECS: u64 = 3600;

const DEFAULT_LOG_LEVEL_STRING: &str = "warn";
const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Warn;
const DEFAULT_LOG_COLORED: bool = true;

const DEFAULT_BACKUP_PREFIX: &str = "bi-admin-backup-delete";

const DEFAULT_SHARED_CHECK_BATCH_SIZE: usize = 100;
const MIN_SHARED_CHECK_BATCH_SIZE: usize = 1;
const MAX_SHARED_CHECK_BATCH_SIZE: usize = 1000;
