use crate::{AbortReason, DeleteResult};

use bi_core::{Filter, ResourceKind};

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Literal the operator must pass to confirm a destructive run
pub const CONFIRM_TOKEN: &str = "DELETE";

/// Which dependent kinds the operator opted into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeOptions {
    pub charts: bool,
    pub datasets: bool,
    pub databases: bool,
    pub skip_shared_check: bool,
}

impl CascadeOptions {
    /// A narrower cascade never widens a broader one: datasets need charts and
    /// databases need datasets.
    pub fn validate(&self) -> DeleteResult<()> {
        if self.datasets && !self.charts {
            return Err(AbortReason::invalid_options(
                "--cascade-datasets requires --cascade-charts",
            ));
        }
        if self.databases && !self.datasets {
            return Err(AbortReason::invalid_options(
                "--cascade-databases requires --cascade-datasets",
            ));
        }
        Ok(())
    }

    /// Dashboards are the direct selection and always count as requested.
    pub fn requested(&self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::Dashboard => true,
            ResourceKind::Chart => self.charts,
            ResourceKind::Dataset => self.datasets,
            ResourceKind::Database => self.databases,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOptions {
    pub dry_run: bool,
    pub confirm: Option<String>,
    pub rollback: bool,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            dry_run: true,
            confirm: None,
            rollback: true,
        }
    }
}

impl ExecutionOptions {
    pub fn is_confirmed(&self) -> bool {
        self.confirm.as_deref() == Some(CONFIRM_TOKEN)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSettings {
    pub dir: PathBuf,
    pub prefix: String,
}

/// Everything one invocation needs, fixed before planning starts.
#[derive(Debug, Clone)]
pub struct DeleteContext {
    pub filters: Vec<Filter>,
    pub cascade: CascadeOptions,
    pub execution: ExecutionOptions,
    /// Database uuid to connection password, injected into the backup before a
    /// rollback import
    pub db_passwords: BTreeMap<String, String>,
    pub backup: BackupSettings,
    pub shared_check_batch_size: usize,
}

/// Parse repeatable `uuid=password` arguments.
pub fn parse_db_passwords(pairs: &[String]) -> DeleteResult<BTreeMap<String, String>> {
    let mut passwords = BTreeMap::new();
    for pair in pairs {
        let Some((uuid, password)) = pair.split_once('=') else {
            return Err(AbortReason::invalid_options(
                "Invalid --db-password value. Use the format uuid=password.",
            ));
        };
        passwords.insert(uuid.to_string(), password.to_string());
    }
    Ok(passwords)
}
