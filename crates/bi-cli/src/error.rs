use bi_client::ClientError;
use bi_config::ConfigError;
use bi_core::CoreError;
use bi_delete::AbortReason;

use std::panic::Location;
use std::path::PathBuf;
use std::process::ExitCode;

use error_location::ErrorLocation;
use thiserror::Error;

/// Exit status for command-line misuse, matching clap's own usage errors
pub const USAGE_EXIT_CODE: u8 = 2;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{message} {location}")]
    Usage {
        message: String,
        location: ErrorLocation,
    },

    #[error("{source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("{source}")]
    Client {
        #[from]
        source: ClientError,
    },

    #[error("{source}")]
    Abort {
        #[from]
        source: AbortReason,
    },

    #[error("Failed to read {path}: {source} {location}")]
    Io {
        path: PathBuf,
        location: ErrorLocation,
        #[source]
        source: std::io::Error,
    },

    #[error("Logger error: {message} {location}")]
    Logger {
        message: String,
        location: ErrorLocation,
    },
}

impl CliError {
    #[track_caller]
    pub fn usage<S: Into<String>>(message: S) -> Self {
        CliError::Usage {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Bad filters and unknown asset types are operator mistakes.
    #[track_caller]
    pub fn from_core(err: CoreError) -> Self {
        CliError::usage(err.to_string())
    }

    #[track_caller]
    pub fn io(path: PathBuf, source: std::io::Error) -> Self {
        CliError::Io {
            path,
            location: ErrorLocation::from(Location::caller()),
            source,
        }
    }

    #[track_caller]
    pub fn logger<S: Into<String>>(message: S) -> Self {
        CliError::Logger {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            CliError::Usage { .. }
                | CliError::Abort {
                    source: AbortReason::InvalidOptions { .. }
                }
        )
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.is_usage() {
            ExitCode::from(USAGE_EXIT_CODE)
        } else {
            ExitCode::FAILURE
        }
    }
}

impl From<CoreError> for CliError {
    #[track_caller]
    fn from(err: CoreError) -> Self {
        CliError::from_core(err)
    }
}

pub type Result<T> = std::result::Result<T, CliError>;

/// Process exit status for a finished command. Dry runs, rejected
/// confirmations and partially failed deletions all finish with `Ok`.
pub fn exit_code<T>(result: &Result<T>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => e.exit_code(),
    }
}
