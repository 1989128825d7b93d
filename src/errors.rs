//! Custom error types for radiomics batch processing

use std::fmt;
use std::io;

/// Error types raised while preparing or running an extraction batch
#[derive(Debug)]
pub enum RadiomicsError {
    /// I/O error
    IoError(io::Error),
    /// Malformed user configuration (numeric lists, feature classes, ...)
    ConfigError(String),
    /// Parameter file missing, unreadable or with an unknown format
    ParameterFileError(String),
    /// Label volume or segmentation could not be read or converted
    VolumeError(String),
    /// External extraction job could not be started or waited on
    JobError(String),
    /// Extractor output could not be parsed into a result set
    ResultError(String),
    /// Generic error with message
    GenericError(String),
}

impl fmt::Display for RadiomicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RadiomicsError::IoError(e) => write!(f, "I/O error: {}", e),
            RadiomicsError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            RadiomicsError::ParameterFileError(msg) => write!(f, "Parameter file error: {}", msg),
            RadiomicsError::VolumeError(msg) => write!(f, "Volume error: {}", msg),
            RadiomicsError::JobError(msg) => write!(f, "Extraction job error: {}", msg),
            RadiomicsError::ResultError(msg) => write!(f, "Result error: {}", msg),
            RadiomicsError::GenericError(msg) => write!(f, "Radiomics error: {}", msg),
        }
    }
}

impl std::error::Error for RadiomicsError {}

impl From<io::Error> for RadiomicsError {
    fn from(error: io::Error) -> Self {
        RadiomicsError::IoError(error)
    }
}

impl From<nifti::NiftiError> for RadiomicsError {
    fn from(error: nifti::NiftiError) -> Self {
        RadiomicsError::VolumeError(error.to_string())
    }
}

impl From<csv::Error> for RadiomicsError {
    fn from(error: csv::Error) -> Self {
        RadiomicsError::ResultError(error.to_string())
    }
}

impl From<serde_json::Error> for RadiomicsError {
    fn from(error: serde_json::Error) -> Self {
        RadiomicsError::ParameterFileError(error.to_string())
    }
}

impl From<serde_yaml::Error> for RadiomicsError {
    fn from(error: serde_yaml::Error) -> Self {
        RadiomicsError::ParameterFileError(error.to_string())
    }
}

/// Result type for radiomics operations
pub type RadiomicsResult<T> = Result<T, RadiomicsError>;

impl From<String> for RadiomicsError {
    fn from(msg: String) -> Self {
        RadiomicsError::GenericError(msg)
    }
}
