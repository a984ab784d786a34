use std::panic::Location;
use std::result::Result as StdResult;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid filter: {message} {location}")]
    InvalidFilter {
        message: String,
        location: ErrorLocation,
    },

    #[error("Invalid resource kind: {value} {location}")]
    InvalidResourceKind {
        value: String,
        location: ErrorLocation,
    },

    #[error("Bundle archive error: {message} {location}")]
    Zip {
        message: String,
        location: ErrorLocation,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Bundle IO error: {message} {location}")]
    Io {
        message: String,
        location: ErrorLocation,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML descriptor {path}: {message} {location}")]
    Yaml {
        path: String,
        message: String,
        location: ErrorLocation,
        #[source]
        source: serde_yaml::Error,
    },
}

impl CoreError {
    /// Create a filter error with location
    #[track_caller]
    pub fn invalid_filter<S: Into<String>>(message: S) -> Self {
        CoreError::InvalidFilter {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Convert zip error with context
    #[track_caller]
    pub fn from_zip(err: zip::result::ZipError) -> Self {
        CoreError::Zip {
            message: err.to_string(),
            location: ErrorLocation::from(Location::caller()),
            source: err,
        }
    }

    /// Convert IO error with context
    #[track_caller]
    pub fn from_io(err: std::io::Error) -> Self {
        CoreError::Io {
            message: err.to_string(),
            location: ErrorLocation::from(Location::caller()),
            source: err,
        }
    }

    #[track_caller]
    pub fn from_yaml(path: &str, err: serde_yaml::Error) -> Self {
        CoreError::Yaml {
            path: path.to_string(),
            message: err.to_string(),
            location: ErrorLocation::from(Location::caller()),
            source: err,
        }
    }
}

impl From<zip::result::ZipError> for CoreError {
    #[track_caller]
    fn from(err: zip::result::ZipError) -> Self {
        CoreError::from_zip(err)
    }
}

impl From<std::io::Error> for CoreError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        CoreError::from_io(err)
    }
}

pub type Result<T> = StdResult<T, CoreError>;
