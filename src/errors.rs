use std::io;
use std::time::Duration;

use thiserror::Error;

/// Enumerates high-level errors returned by this library.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Represents a request body that isn't a valid birth-data record.
    #[error("Malformed request body: {0}")]
    MalformedRequest(#[source] serde_json::Error),

    /// Represents a date or time of birth that isn't a real instant.
    #[error("Invalid date/time format: {dob} {tob}")]
    InvalidDateTime { dob: String, tob: String },

    /// Represents a gender other than `male` or `female`.
    #[error("Invalid gender: {0}")]
    InvalidGender(String),

    /// Represents a name that is blank after normalization.
    #[error("Name must not be empty")]
    EmptyName,

    /// Represents birth data the library refused or never validated.
    #[error("Invalid birth data: {0}")]
    InvalidBirthData(String),

    /// Represents a generation call that produced neither a chart nor an
    /// output file.
    #[error("Failed to generate chart")]
    GenerationFailed,

    /// Represents a chart request that didn't finish in time.
    #[error("Chart generation timed out after {0:?}")]
    GenerationTimedOut(Duration),

    /// Represents an output file that couldn't be read as a chart.
    #[error("Malformed chart output: {0}")]
    MalformedChartOutput(#[source] serde_json::Error),

    /// Represents an error creating, reading or removing the scratch
    /// directory.
    #[error("Temporary file error: {0}")]
    TemporaryFileError(#[source] io::Error),

    /// Represents an unexpected failure inside the library.
    #[error("{0}")]
    Library(#[source] LibraryError),

    /// Represents a panic or cancellation of the blocking task.
    #[error("Chart task failed: {0}")]
    TaskFailed(#[source] tokio::task::JoinError),
}

impl BackendError {
    /// Returns whether the caller, rather than the service or the
    /// library, is at fault.
    pub fn is_client_error(&self) -> bool {
        use BackendError::*;

        matches!(
            self,
            MalformedRequest(..)
                | InvalidDateTime { .. }
                | InvalidGender(..)
                | EmptyName
                | InvalidBirthData(..)
        )
    }
}

impl From<LibraryError> for BackendError {
    fn from(e: LibraryError) -> Self {
        match e {
            LibraryError::InvalidInput(reason) => BackendError::InvalidBirthData(reason),
            e => BackendError::Library(e),
        }
    }
}

/// Enumerates errors raised by a [`Library`](crate::library::Library).
#[derive(Debug, Error)]
pub enum LibraryError {
    /// Represents birth data the library refuses to accept.
    #[error("{0}")]
    InvalidInput(String),

    /// Represents a call made while the library is in the wrong state.
    #[error("{0}")]
    InvalidState(&'static str),

    /// Represents a failure reported by the library itself.
    #[error("{0}")]
    Failed(String),

    /// Represents an error writing the generator input file.
    #[error("Failed to prepare generator input: {0}")]
    InputFileError(#[source] io::Error),

    /// Represents an error launching the generator.
    #[error("Failed to run chart generator: {0}")]
    GeneratorFailed(#[source] io::Error),

    /// Represents generator output that isn't JSON.
    #[error("Malformed generator output: {0}")]
    MalformedOutput(#[source] serde_json::Error),
}
