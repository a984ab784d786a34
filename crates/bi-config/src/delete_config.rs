use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_SHARED_CHECK_BATCH_SIZE, MAX_SHARED_CHECK_BATCH_SIZE,
    MIN_SHARED_CHECK_BATCH_SIZE,
};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeleteConfig {
    /// Dashboards exported per request when scanning for shared dependencies
    pub shared_check_batch_size: usize,
}

impl Default for DeleteConfig {
    fn default() -> Self {
        Self {
            shared_check_batch_size: DEFAULT_SHARED_CHECK_BATCH_SIZE,
        }
    }
}

impl DeleteConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if !(MIN_SHARED_CHECK_BATCH_SIZE..=MAX_SHARED_CHECK_BATCH_SIZE)
            .contains(&self.shared_check_batch_size)
        {
            return Err(ConfigError::delete(format!(
                "delete.shared_check_batch_size must be {}-{}, got {}",
                MIN_SHARED_CHECK_BATCH_SIZE,
                MAX_SHARED_CHECK_BATCH_SIZE,
                self.shared_check_batch_size
            )));
        }
        Ok(())
    }
}
