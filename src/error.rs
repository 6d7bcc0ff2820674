//! Error types for arduino-manager

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("non-semver version provided: {version}")]
    InvalidVersion { version: String },

    #[error("version {version} is not supported, the minimum supported version is {floor}")]
    UnsupportedVersion { version: String, floor: String },

    #[error("the version provided is not available: {version}")]
    UnavailableVersion { version: String },

    #[error("network error: {message}")]
    Network {
        status: Option<u16>,
        message: String,
    },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to run binary: {0}")]
    Process(String),

    #[error("archive error: {0}")]
    Archive(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP status associated with this error, when one is known.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Network { status, .. } => *status,
            _ => None,
        }
    }

    pub(crate) fn http_status(status: reqwest::StatusCode, url: &str) -> Self {
        Error::Network {
            status: Some(status.as_u16()),
            message: format!("request to {} failed with status {}", url, status),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Archive(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
