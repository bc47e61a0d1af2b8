//! Core error types for rangeday-core.
//!
//! This module defines the error hierarchy using thiserror. Validation
//! failures are surfaced synchronously and never persisted; store failures
//! are caught at the persistence boundary and in-memory state is kept
//! (optimistic, no rollback).

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Core error type for rangeday-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Persistence gateway errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Persistence gateway errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the local database
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Invalid remote endpoint
    #[error("Invalid API base URL '{0}'")]
    InvalidBaseUrl(String),

    /// HTTP transport failure
    #[error("Request to {url} failed: {message}")]
    RequestFailed { url: String, message: String },

    /// Remote endpoint answered outside the 2xx range
    #[error("Unexpected status {status} from {url}")]
    BadStatus { status: u16, url: String },

    /// Record lookup miss
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Stored payload could not be decoded
    #[error("Failed to decode stored record: {0}")]
    Decode(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Only the current local day may be started
    #[error("Cannot start {day_key}: only today ({today}) can be started")]
    NotToday { day_key: NaiveDate, today: NaiveDate },

    /// The filtered plan for the requested day came up empty
    #[error("Cannot start {day_key}: no occurrences planned for that day")]
    EmptyPlan { day_key: NaiveDate },

    /// A second session may not be started while one is active
    #[error("A day session is already active for {day_key}")]
    AlreadyActive { day_key: NaiveDate },

    /// The operation needs an active session
    #[error("No day session is active")]
    NoActiveSession,

    /// The occurrence id is not part of the active plan
    #[error("Unknown occurrence id: {0}")]
    UnknownOccurrence(String),

    /// Invalid field value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::QueryFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
