//! `bi-admin delete-assets`

use crate::commands::DeleteAssetsArgs;
use crate::error::{CliError, Result as CliResult};
use crate::platform_client;

use bi_client::PlatformApi;
use bi_config::Config;
use bi_core::ResourceKind;
use bi_core::filter::parse_filters;
use bi_delete::display::render_no_matches;
use bi_delete::{
    AbortReason, BackupSettings, CascadeOptions, DeleteContext, DeleteEngine, DeleteOutcome,
    ExecutionOptions, parse_db_passwords, plan_deletion,
};

use std::io::Write;

use log::info;

/// Turn parsed arguments and configuration into the context the engine runs
/// with. Every usage problem surfaces here, before any request is sent.
pub fn build_context(args: &DeleteAssetsArgs, config: &Config) -> CliResult<DeleteContext> {
    let kind: ResourceKind = args.asset_type.parse()?;
    if kind != ResourceKind::Dashboard {
        return Err(CliError::usage(format!(
            "Unsupported asset type '{kind}'. Only dashboard deletion is supported."
        )));
    }

    let filters = parse_filters(&args.filters, kind)?;
    let cascade = CascadeOptions {
        charts: args.cascade_charts,
        datasets: args.cascade_datasets,
        databases: args.cascade_databases,
        skip_shared_check: args.skip_shared_check,
    };
    cascade.validate()?;

    Ok(DeleteContext {
        filters,
        cascade,
        execution: ExecutionOptions {
            dry_run: args.effective_dry_run(),
            confirm: args.confirm.clone(),
            rollback: args.rollback_enabled(),
        },
        db_passwords: parse_db_passwords(&args.db_passwords)?,
        backup: BackupSettings {
            dir: config.backup.directory(),
            prefix: config.backup.prefix.clone(),
        },
        shared_check_batch_size: config.delete.shared_check_batch_size,
    })
}

/// Plan and run one deletion, writing the report to `out`. `None` when no
/// dashboard matched.
pub async fn run<W: Write>(
    api: &dyn PlatformApi,
    context: &DeleteContext,
    out: &mut W,
) -> CliResult<Option<DeleteOutcome>> {
    let Some(plan) = plan_deletion(api, context).await? else {
        info!("No dashboards matched {} filter(s)", context.filters.len());
        out.write_all(render_no_matches().as_bytes())
            .map_err(AbortReason::from)?;
        return Ok(None);
    };
    info!(
        "Planned {} deletions across {} kinds",
        plan.total(),
        plan.scheduled_kinds().len()
    );

    let outcome = DeleteEngine::new(api, context).run(&plan, out).await?;
    Ok(Some(outcome))
}

pub async fn execute(config: &Config, args: &DeleteAssetsArgs) -> CliResult<()> {
    let context = build_context(args, config)?;
    let client = platform_client(config)?;
    run(&client, &context, &mut std::io::stdout()).await?;
    Ok(())
}
