//! Pre-deletion backups and manual restore.

use crate::{AbortReason, BackupSettings, DeleteContext, DeletePlan, DeleteResult};

use bi_client::PlatformApi;
use bi_core::ResourceKind;
use bi_core::bundle::apply_db_passwords;

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;
use log::info;

/// A backup written to disk, with the bytes kept for rollback.
#[derive(Debug, Clone)]
pub struct Backup {
    pub path: PathBuf,
    pub data: Vec<u8>,
}

/// Write `data` to `<prefix>-<YYYYmmdd-HHMMSS>-<random>.zip` in the backup
/// directory. The file is owner-only on Unix and survives the process.
pub fn write_backup(settings: &BackupSettings, data: &[u8]) -> DeleteResult<PathBuf> {
    let timestamp = Local::now().format("%Y%m%d-%H%M%S");
    let prefix = format!("{}-{}-", settings.prefix, timestamp);

    let mut file = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".zip")
        .tempfile_in(&settings.dir)
        .map_err(|e| AbortReason::backup(settings.dir.clone(), e))?;
    file.write_all(data)
        .map_err(|e| AbortReason::backup(file.path().to_path_buf(), e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o600))
            .map_err(|e| AbortReason::backup(file.path().to_path_buf(), e))?;
    }

    let path = file.path().to_path_buf();
    file.keep().map_err(|e| AbortReason::backup(path.clone(), e.error))?;
    info!("Backup written to {}", path.display());
    Ok(path)
}

/// Back up the selected dashboards before anything is deleted, reusing the
/// cascade export when planning already took one.
pub async fn take_backup(
    api: &dyn PlatformApi,
    context: &DeleteContext,
    plan: &DeletePlan,
) -> DeleteResult<Backup> {
    let data = match &plan.cascade_bundle {
        Some(bundle) => bundle.clone(),
        None => {
            let ids: Vec<i64> = plan.dashboard_ids.iter().copied().collect();
            api.export_bundle(ResourceKind::Dashboard, &ids).await?
        }
    };
    let path = write_backup(&context.backup, &data)?;
    Ok(Backup { path, data })
}

/// Re-import a backup with overwrite, injecting database passwords first.
pub async fn restore_backup(
    api: &dyn PlatformApi,
    kind: ResourceKind,
    path: &str,
    data: &[u8],
    db_passwords: &BTreeMap<String, String>,
) -> DeleteResult<()> {
    let bundle = apply_db_passwords(data, db_passwords)?;
    if !api.import_bundle(kind, bundle, true).await? {
        return Err(AbortReason::import_rejected(path));
    }
    info!("Restored {path} as {kind} bundle");
    Ok(())
}
