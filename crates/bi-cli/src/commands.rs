use bi_core::filter::parse_bool;

use clap::{ArgAction, Args, Subcommand};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Delete dashboards matching filters, optionally cascading to their charts,
    /// datasets and databases
    DeleteAssets(DeleteAssetsArgs),

    /// Re-import a backup zip written by delete-assets
    Restore(RestoreArgs),
}

#[derive(Args, Debug)]
pub struct DeleteAssetsArgs {
    /// Asset type to delete (only dashboard is supported)
    #[arg(long = "asset-type")]
    pub asset_type: String,

    /// Filter as key=value; repeat to AND several filters
    #[arg(short = 't', long = "filter")]
    pub filters: Vec<String>,

    /// Also delete charts used by the selected dashboards
    #[arg(short = 'c', long)]
    pub cascade_charts: bool,

    /// Also delete datasets used by those charts (requires --cascade-charts)
    #[arg(short = 'd', long)]
    pub cascade_datasets: bool,

    /// Also delete databases used by those datasets (requires --cascade-datasets)
    #[arg(short = 'b', long)]
    pub cascade_databases: bool,

    /// Show the plan without deleting anything
    #[arg(
        short = 'r',
        long = "dry-run",
        action = ArgAction::Set,
        value_parser = parse_bool_arg,
        default_value = "true"
    )]
    pub dry_run: bool,

    /// Same as --dry-run=false
    #[arg(long = "no-dry-run")]
    pub no_dry_run: bool,

    /// Confirmation token; must be exactly DELETE
    #[arg(long)]
    pub confirm: Option<String>,

    /// Do not protect charts, datasets or databases used by other dashboards
    #[arg(long)]
    pub skip_shared_check: bool,

    /// Re-import the backup when some deletions fail (default)
    #[arg(long, overrides_with = "no_rollback")]
    pub rollback: bool,

    /// Leave a partially failed deletion as is
    #[arg(long = "no-rollback", overrides_with = "rollback")]
    pub no_rollback: bool,

    /// Database password as uuid=password, used when re-importing databases
    #[arg(long = "db-password")]
    pub db_passwords: Vec<String>,
}

impl DeleteAssetsArgs {
    pub fn effective_dry_run(&self) -> bool {
        self.dry_run && !self.no_dry_run
    }

    pub fn rollback_enabled(&self) -> bool {
        !self.no_rollback
    }
}

#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Backup zip to import
    pub path: String,

    /// Asset type the bundle holds
    #[arg(long = "asset-type", default_value = "dashboard")]
    pub asset_type: String,

    /// Database password as uuid=password
    #[arg(long = "db-password")]
    pub db_passwords: Vec<String>,
}

/// Boolean flag values, case-insensitive.
fn parse_bool_arg(value: &str) -> Result<bool, String> {
    parse_bool(value).ok_or_else(|| format!("invalid boolean '{value}', expected true or false"))
}
