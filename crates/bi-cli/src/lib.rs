//! bi-cli library
//!
//! Argument parsing, logging setup and the command runners behind the
//! `bi-admin` binary.

pub mod cli;
pub mod commands;
pub mod delete_assets;
pub mod error;
pub mod logger;
pub mod restore;

#[cfg(test)]
mod tests;

pub use cli::Cli;
pub use commands::{Commands, DeleteAssetsArgs, RestoreArgs};
pub use error::{CliError, Result as CliResult};

use bi_client::Client;
use bi_config::Config;

use std::time::Duration;

/// HTTP client for the configured platform.
pub fn platform_client(config: &Config) -> CliResult<Client> {
    Ok(Client::new(
        &config.platform.url,
        config.platform.access_token.as_deref(),
        Duration::from_secs(config.platform.timeout_secs),
    )?)
}
