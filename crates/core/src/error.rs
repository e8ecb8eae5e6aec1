//! Error types for R-Droid
//!
//! Centralized error handling using thiserror.

use r_droid_build_engine::{SizeError, SplitError};
use r_droid_targeting::TargetingError;
use thiserror::Error;

/// Main error type for R-Droid
#[derive(Error, Debug)]
pub enum RDroidError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Targeting(#[from] TargetingError),

    #[error("Split error: {0}")]
    Split(#[from] SplitError),

    #[error("Size error: {0}")]
    Size(#[from] SizeError),

    #[error("Worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type alias for R-Droid operations
pub type Result<T> = std::result::Result<T, RDroidError>;

impl RDroidError {
    /// Only device mismatches are recoverable: the caller can retry with a
    /// different device description.
    pub fn is_recoverable(&self) -> bool {
        match self {
            RDroidError::Targeting(e) => e.is_device_mismatch(),
            RDroidError::Split(SplitError::Targeting(e)) | RDroidError::Size(SizeError::Targeting(e)) => {
                e.is_device_mismatch()
            }
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            RDroidError::Io(e) => format!("File operation failed: {}", e),
            RDroidError::Config(msg) => format!("Configuration error: {}", msg),
            RDroidError::TomlParse(e) => format!("Config file is not valid TOML: {}", e),
            RDroidError::Json(e) => format!("Input is not valid JSON: {}", e),
            RDroidError::Targeting(e) if e.is_device_mismatch() => {
                format!("The device is not supported by this app: {}", e)
            }
            RDroidError::Size(SizeError::MissingSize { path }) => {
                format!("Size table has no entry for {}", path)
            }
            _ => self.to_string(),
        }
    }
}
