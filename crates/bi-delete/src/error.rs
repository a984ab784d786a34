use crate::EngineState;

use bi_client::ClientError;
use bi_core::{CoreError, ResourceKind};

use std::panic::Location;
use std::path::PathBuf;

use error_location::ErrorLocation;
use thiserror::Error;

/// Reasons the command stops before any resource is deleted.
#[derive(Error, Debug)]
pub enum AbortReason {
    #[error("Invalid options: {message} {location}")]
    InvalidOptions {
        message: String,
        location: ErrorLocation,
    },

    #[error(
        "Failed to fetch {kind}s ({message}). Filter key(s) {} may not be supported by this platform version. {location}",
        .keys.join(", ")
    )]
    FilterUnsupported {
        kind: ResourceKind,
        keys: Vec<String>,
        message: String,
        location: ErrorLocation,
    },

    #[error(
        "Aborting deletion: databases have datasets not in cascade set. Extra dataset IDs: {} {location}",
        violation_list(.dataset_ids, .unidentified)
    )]
    PreflightViolation {
        dataset_ids: Vec<i64>,
        /// Labels of offending datasets the platform returned without an id
        unidentified: Vec<String>,
        location: ErrorLocation,
    },

    #[error("Rollback requires a DB password (--db-password) when deleting databases. {location}")]
    CredentialsMissing { location: ErrorLocation },

    #[error("Platform request failed: {message} {location}")]
    Client {
        message: String,
        location: ErrorLocation,
        #[source]
        source: ClientError,
    },

    #[error("Bundle error: {message} {location}")]
    Bundle {
        message: String,
        location: ErrorLocation,
        #[source]
        source: CoreError,
    },

    #[error("Backup error writing {path}: {source} {location}")]
    Backup {
        path: PathBuf,
        location: ErrorLocation,
        #[source]
        source: std::io::Error,
    },

    #[error("The platform did not acknowledge the import of {path} {location}")]
    ImportRejected {
        path: String,
        location: ErrorLocation,
    },

    #[error("Output error: {source} {location}")]
    Output {
        location: ErrorLocation,
        #[source]
        source: std::io::Error,
    },

    #[error("Illegal state transition {from:?} -> {to:?} {location}")]
    IllegalTransition {
        from: EngineState,
        to: EngineState,
        location: ErrorLocation,
    },
}

impl AbortReason {
    #[track_caller]
    pub fn invalid_options<S: Into<String>>(message: S) -> Self {
        AbortReason::InvalidOptions {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn filter_unsupported<S: Into<String>>(
        kind: ResourceKind,
        keys: Vec<String>,
        message: S,
    ) -> Self {
        AbortReason::FilterUnsupported {
            kind,
            keys,
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn preflight_violation(dataset_ids: Vec<i64>, unidentified: Vec<String>) -> Self {
        AbortReason::PreflightViolation {
            dataset_ids,
            unidentified,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn credentials_missing() -> Self {
        AbortReason::CredentialsMissing {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Convert client error with context
    #[track_caller]
    pub fn from_client(err: ClientError) -> Self {
        AbortReason::Client {
            message: err.to_string(),
            location: ErrorLocation::from(Location::caller()),
            source: err,
        }
    }

    #[track_caller]
    pub fn from_core(err: CoreError) -> Self {
        AbortReason::Bundle {
            message: err.to_string(),
            location: ErrorLocation::from(Location::caller()),
            source: err,
        }
    }

    #[track_caller]
    pub fn backup(path: PathBuf, source: std::io::Error) -> Self {
        AbortReason::Backup {
            path,
            location: ErrorLocation::from(Location::caller()),
            source,
        }
    }

    #[track_caller]
    pub fn import_rejected<S: Into<String>>(path: S) -> Self {
        AbortReason::ImportRejected {
            path: path.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn illegal_transition(from: EngineState, to: EngineState) -> Self {
        AbortReason::IllegalTransition {
            from,
            to,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

fn violation_list(dataset_ids: &[i64], unidentified: &[String]) -> String {
    dataset_ids
        .iter()
        .map(ToString::to_string)
        .chain(unidentified.iter().map(|label| format!("{label} (no id)")))
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<ClientError> for AbortReason {
    #[track_caller]
    fn from(err: ClientError) -> Self {
        AbortReason::from_client(err)
    }
}

impl From<CoreError> for AbortReason {
    #[track_caller]
    fn from(err: CoreError) -> Self {
        AbortReason::from_core(err)
    }
}

impl From<std::io::Error> for AbortReason {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        AbortReason::Output {
            location: ErrorLocation::from(Location::caller()),
            source: err,
        }
    }
}

pub type Result<T> = std::result::Result<T, AbortReason>;
