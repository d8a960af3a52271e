//! Unified error handling for evslot operations.
//!
//! Every failure is a rejected operation that leaves prior state unchanged.
//! Callers get a machine-readable [`ErrorCode`] plus a message suitable for
//! showing to the user.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::StoreError;

/// Error codes surfaced to the UI layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    DuplicateEmail,
    InvalidCredentials,
    StationNotFound,
    NoVacancy,
    InvalidCoordinate,
    InvalidSlotConfig,
    StorageError,
}

impl ErrorCode {
    /// Get the string representation of the error code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::DuplicateEmail => "duplicate_email",
            ErrorCode::InvalidCredentials => "invalid_credentials",
            ErrorCode::StationNotFound => "station_not_found",
            ErrorCode::NoVacancy => "no_vacancy",
            ErrorCode::InvalidCoordinate => "invalid_coordinate",
            ErrorCode::InvalidSlotConfig => "invalid_slot_config",
            ErrorCode::StorageError => "storage_error",
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Station not found: {0}")]
    StationNotFound(String),

    #[error("No slots available at station {0}")]
    NoVacancy(String),

    #[error("Invalid latitude/longitude: ({lat}, {lng})")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("Invalid slot configuration: {0}")]
    InvalidSlotConfig(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::DuplicateEmail => ErrorCode::DuplicateEmail,
            ApiError::InvalidCredentials => ErrorCode::InvalidCredentials,
            ApiError::StationNotFound(_) => ErrorCode::StationNotFound,
            ApiError::NoVacancy(_) => ErrorCode::NoVacancy,
            ApiError::InvalidCoordinate { .. } => ErrorCode::InvalidCoordinate,
            ApiError::InvalidSlotConfig(_) => ErrorCode::InvalidSlotConfig,
            ApiError::Store(_) => ErrorCode::StorageError,
        }
    }

    /// Short message for the UI; storage details stay in the logs
    pub fn user_message(&self) -> String {
        match self {
            ApiError::StationNotFound(_) => "Station not found".to_string(),
            ApiError::NoVacancy(_) => "No slots available".to_string(),
            ApiError::InvalidCoordinate { .. } => "Invalid latitude/longitude".to_string(),
            ApiError::Store(e) => {
                tracing::error!(error = %e, "Store error");
                "Could not save changes, please try again".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// The inner error object handed to the UI layer
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl From<&ApiError> for ErrorBody {
    fn from(err: &ApiError) -> Self {
        Self {
            code: err.code().as_str().to_string(),
            message: err.user_message(),
        }
    }
}
