//! Best-effort recovery after a partially failed run.

use crate::ExecutionReport;
use crate::resolver::{Resolution, resolve_ids};

use bi_client::PlatformApi;
use bi_core::ResourceKind;
use bi_core::bundle::{apply_db_passwords, extract_uuids_by_kind};

use std::collections::BTreeMap;

use log::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackOutcome {
    NotAttempted,
    /// Kinds listed in `unverifiable` could not be checked on this platform
    Succeeded { unverifiable: Vec<ResourceKind> },
    ImportFailed { message: String },
    VerificationFailed {
        kinds: Vec<ResourceKind>,
        unverifiable: Vec<ResourceKind>,
    },
}

/// Rollback only makes sense when some deletions landed and some did not. An
/// all-failed run changed nothing.
pub fn should_rollback(enabled: bool, report: &ExecutionReport) -> bool {
    enabled && !report.succeeded.is_empty() && !report.failed.is_empty()
}

/// Re-import the backup as a dashboard bundle, then check that every uuid of
/// the `expected` kinds is back.
pub async fn rollback_deletion(
    api: &dyn PlatformApi,
    backup: &[u8],
    db_passwords: &BTreeMap<String, String>,
    expected: &[ResourceKind],
) -> RollbackOutcome {
    let bundle = match apply_db_passwords(backup, db_passwords) {
        Ok(bundle) => bundle,
        Err(e) => {
            error!("Rollback failed preparing backup: {e}");
            return RollbackOutcome::ImportFailed {
                message: e.to_string(),
            };
        }
    };

    match api.import_bundle(ResourceKind::Dashboard, bundle, true).await {
        Ok(true) => info!("Rollback import accepted"),
        Ok(false) => {
            return RollbackOutcome::ImportFailed {
                message: String::from("the platform did not acknowledge the import"),
            };
        }
        Err(e) => {
            error!("Rollback import failed: {e}");
            return RollbackOutcome::ImportFailed {
                message: e.to_string(),
            };
        }
    }

    verify_restoration(api, backup, expected).await
}

async fn verify_restoration(
    api: &dyn PlatformApi,
    backup: &[u8],
    expected: &[ResourceKind],
) -> RollbackOutcome {
    let backup_uuids = match extract_uuids_by_kind(backup) {
        Ok(uuids) => uuids,
        Err(e) => {
            warn!("Cannot read backup for rollback verification: {e}");
            return RollbackOutcome::Succeeded {
                unverifiable: expected.to_vec(),
            };
        }
    };

    let mut missing = Vec::new();
    let mut unverifiable = Vec::new();
    for &kind in expected {
        let Some(uuids) = backup_uuids.get(&kind).filter(|uuids| !uuids.is_empty()) else {
            continue;
        };
        match resolve_ids(api, kind, uuids).await {
            Ok(Resolution::Resolved(resolved)) if !resolved.missing.is_empty() => {
                missing.push(kind);
            }
            Ok(Resolution::Resolved(_)) => {}
            Ok(Resolution::Unavailable) => unverifiable.push(kind),
            Err(e) => {
                warn!("Cannot verify rollback of {kind}: {e}");
                unverifiable.push(kind);
            }
        }
    }

    if missing.is_empty() {
        RollbackOutcome::Succeeded { unverifiable }
    } else {
        RollbackOutcome::VerificationFailed {
            kinds: missing,
            unverifiable,
        }
    }
}
