//! `bi-admin restore`

use crate::commands::RestoreArgs;
use crate::error::{CliError, Result as CliResult};
use crate::platform_client;

use bi_client::PlatformApi;
use bi_config::Config;
use bi_core::ResourceKind;
use bi_delete::backup::restore_backup;
use bi_delete::{AbortReason, parse_db_passwords};

use std::io::Write;
use std::path::PathBuf;

/// Import the backup at `args.path` with overwrite. A bundle the platform does
/// not acknowledge is an error.
pub async fn run<W: Write>(
    api: &dyn PlatformApi,
    args: &RestoreArgs,
    out: &mut W,
) -> CliResult<()> {
    let kind: ResourceKind = args.asset_type.parse()?;
    let passwords = parse_db_passwords(&args.db_passwords)?;
    let data =
        std::fs::read(&args.path).map_err(|e| CliError::io(PathBuf::from(&args.path), e))?;

    restore_backup(api, kind, &args.path, &data, &passwords).await?;
    writeln!(out, "Restored {} from {}.", kind.plural(), args.path)
        .map_err(AbortReason::from)?;
    Ok(())
}

pub async fn execute(config: &Config, args: &RestoreArgs) -> CliResult<()> {
    let client = platform_client(config)?;
    run(&client, args, &mut std::io::stdout()).await
}
