use crate::{ConfigError, ConfigErrorResult, DEFAULT_BACKUP_PREFIX};

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Directory for pre-deletion backups (system temp dir when unset)
    pub dir: Option<String>,
    /// File name prefix for backup archives
    pub prefix: String,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            dir: None,
            prefix: String::from(DEFAULT_BACKUP_PREFIX),
        }
    }
}

impl BackupConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.prefix.trim().is_empty() {
            return Err(ConfigError::backup("backup.prefix cannot be empty"));
        }
        if self.prefix.contains('/') || self.prefix.contains('\\') {
            return Err(ConfigError::backup(format!(
                "backup.prefix cannot contain path separators, got '{}'",
                self.prefix
            )));
        }
        Ok(())
    }

    /// Resolved backup directory.
    pub fn directory(&self) -> PathBuf {
        self.dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
    }
}
