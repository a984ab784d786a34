use crate::commands::Commands;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "bi-admin")]
#[command(about = "Administrative asset management for a BI platform")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Platform URL (overrides platform.url from config.toml and BI_PLATFORM_URL)
    #[arg(long, global = true)]
    pub url: Option<String>,
}
