//! bi-admin - BI platform administration CLI
//!
//! # Examples
//!
//! ```bash
//! # Show what deleting one dashboard and everything only it uses would remove
//! bi-admin delete-assets --asset-type dashboard -t id=42 -c -d
//!
//! # Actually delete
//! bi-admin delete-assets --asset-type dashboard -t id=42 -c -d --dry-run=false --confirm=DELETE
//!
//! # Re-import a backup
//! bi-admin restore /tmp/bi-admin-backup-delete-20240101-120000-abc123.zip
//! ```

use bi_cli::{Cli, CliResult, Commands, delete_assets, error, logger, restore};
use bi_config::Config;

use std::process::ExitCode;

use clap::Parser;
use log::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return e.exit_code();
        }
    };

    let result = match cli.command {
        Commands::DeleteAssets(ref args) => delete_assets::execute(&config, args).await,
        Commands::Restore(ref args) => restore::execute(&config, args).await,
    };

    if let Err(ref e) = result {
        eprintln!("Error: {}", e);
    }
    error::exit_code(&result)
}

/// Load and validate configuration, apply the `--url` override and start logging.
fn load_config(cli: &Cli) -> CliResult<Config> {
    let mut config = Config::load()?;
    if let Some(ref url) = cli.url {
        config.platform.url = url.clone();
    }
    config.validate()?;

    let log_file = match config.logging.file {
        Some(ref file) => Some(Config::config_dir()?.join(file)),
        None => None,
    };
    logger::initialize(config.logging.level, log_file, config.logging.colored)?;

    info!("Starting bi-admin v{}", env!("CARGO_PKG_VERSION"));
    config.log_summary();
    Ok(config)
}
