//! Error types for the follow-up tracker.
//!
//! This module defines custom error types using `thiserror` for precise error handling.
//! Row-level and evaluation-level errors are recovered where they occur; container,
//! registration, store and configuration errors surface to the caller.

use thiserror::Error;

/// Errors that make a whole interchange file unusable.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The container could not be read at all (I/O, corrupt archive, bad CSV framing)
    #[error("Failed to read file: {0}")]
    ContainerRead(String),

    /// The container was readable but does not look like an export of ours
    #[error("Unrecognized file format: {0}")]
    UnrecognizedFormat(String),

    /// The file extension does not map to a supported format
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    /// Writing the export failed
    #[error("Failed to write export: {0}")]
    Write(String),

    /// Filesystem error while reading or writing an export file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for CodecError {
    fn from(err: csv::Error) -> Self {
        CodecError::ContainerRead(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for CodecError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        CodecError::Write(err.to_string())
    }
}

impl From<calamine::XlsxError> for CodecError {
    fn from(err: calamine::XlsxError) -> Self {
        CodecError::ContainerRead(err.to_string())
    }
}

/// Why a single imported row was discarded.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowParseError {
    /// Row is shorter than its record type requires
    #[error("{kind} row has {found} fields, expected at least {expected}")]
    FieldCount {
        kind: &'static str,
        expected: usize,
        found: usize,
    },

    /// Row discriminator is neither `Customer` nor `FollowUp`
    #[error("Unknown row type: {0:?}")]
    UnknownType(String),

    /// Row carries no usable identifier
    #[error("Missing {0}")]
    MissingField(&'static str),

    /// A numeric column did not parse
    #[error("Invalid number in {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    /// A date column did not parse as YYYY-MM-DD
    #[error("Invalid date in {field}: {value:?}")]
    InvalidDate { field: &'static str, value: String },

    /// A spreadsheet cell held a value of the wrong kind
    #[error("Unexpected cell type in {0}")]
    CellType(&'static str),

    /// The CSV reader could not decode the row
    #[error("Malformed row: {0}")]
    Malformed(String),
}

/// Errors raised while (re)registering reminder jobs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// The job-scheduling facility refused a registration
    #[error("Failed to register reminder {id}: {reason}")]
    Registration { id: String, reason: String },

    /// The job-scheduling facility is not running
    #[error("Job scheduler unavailable: {0}")]
    Unavailable(String),
}

/// Errors returned by the record store collaborators.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Record with the same id already exists
    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    /// Snapshot could not be serialized or deserialized
    #[error("Store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backing file could not be read or written
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Store is not reachable
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Errors that happen while evaluating a reminder fire.
///
/// These never cross the job boundary; the evaluator turns them into a
/// failed fire outcome and the recurrence continues.
#[derive(Error, Debug)]
pub enum EvaluationError {
    /// Customer collection could not be read
    #[error("Failed to read customers: {0}")]
    Store(#[from] StoreError),

    /// The alert could not be shown
    #[error(transparent)]
    Notify(#[from] NotifyError),
}

/// The user-alert facility refused or failed to show an alert.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to show alert: {0}")]
pub struct NotifyError(pub String);

/// Errors surfaced by the service layer to the initiating caller.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Input rejected before touching the store
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

impl From<crate::domain::ValidationError> for ServiceError {
    fn from(err: crate::domain::ValidationError) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment variable has invalid value
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
}

/// Convenience type alias for Results with CodecError
pub type CodecResult<T> = Result<T, CodecError>;

/// Convenience type alias for Results with SchedulerError
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Convenience type alias for Results with StoreError
pub type StoreResult<T> = Result<T, StoreError>;

/// Convenience type alias for Results with ServiceError
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Convenience type alias for Results with ConfigError
pub type ConfigResult<T> = Result<T, ConfigError>;
