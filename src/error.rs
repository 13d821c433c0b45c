//! Error types for the cloudie library.
//!
//! Failures are split the way the dispatcher treats them:
//!
//! - [`CommandError`]: the storage backend rejected or failed an operation.
//!   Recoverable; delivered to the callback sink through `on_error`.
//! - [`FatalError`]: anything else (local I/O, defects). Never delivered as a
//!   callback; it ends the worker with a diagnostic.
//!
//! [`OpError`] carries that tag explicitly so the dispatcher can match on it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::StatusKind;

/// Recoverable failure reported by the storage backend.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandError {
    /// Container or object does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request conflicts with the current state (e.g. non-empty container).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Authentication was refused.
    #[error("Authentication failed")]
    Unauthorized,

    /// A container or object operation was invoked without a live session.
    #[error("Not logged in")]
    NotLoggedIn,

    /// Any other HTTP status returned by the backend.
    #[error("HTTP error {status}: {}", .kind.description())]
    Http { status: u16, kind: StatusKind },

    /// The transport failed before a status was received.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl CommandError {
    /// Build an error from an HTTP status code and the subject it concerns.
    pub fn from_status(status: u16, subject: impl Into<String>) -> Self {
        match StatusKind::from(status) {
            StatusKind::NotFound => CommandError::NotFound(subject.into()),
            StatusKind::Conflict => CommandError::Conflict(subject.into()),
            StatusKind::Unauthorized => CommandError::Unauthorized,
            kind => CommandError::Http { status, kind },
        }
    }
}

/// Unexpected failure. Indicates a defect or an environment problem rather
/// than an operational condition.
#[derive(Error, Debug)]
pub enum FatalError {
    /// Local I/O failed (reading an upload source, writing a download target).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invariant violation or a worker that died unexpectedly.
    #[error("{0}")]
    Defect(String),
}

/// Outcome tag of a failed operation.
#[derive(Error, Debug)]
pub enum OpError {
    #[error(transparent)]
    Recoverable(#[from] CommandError),

    #[error(transparent)]
    Fatal(#[from] FatalError),
}

impl OpError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, OpError::Recoverable(_))
    }
}

impl From<std::io::Error> for OpError {
    fn from(err: std::io::Error) -> Self {
        OpError::Fatal(FatalError::Io(err))
    }
}

impl From<CloudieError> for OpError {
    fn from(err: CloudieError) -> Self {
        match err {
            CloudieError::Command(err) => OpError::Recoverable(err),
            CloudieError::Fatal(err) => OpError::Fatal(err),
            other => OpError::Fatal(FatalError::Defect(other.to_string())),
        }
    }
}

/// Main error type for entry points that are not dispatched.
#[derive(Error, Debug)]
pub enum CloudieError {
    /// The caller supplied an invalid setup (missing callback, zero page size).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The session actor is no longer running.
    #[error("Session actor stopped")]
    SessionStopped,

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Fatal(#[from] FatalError),
}

/// Result type alias for cloudie entry points.
pub type Result<T> = std::result::Result<T, CloudieError>;

/// Result of a storage use-case.
pub type OpResult<T> = std::result::Result<T, OpError>;

/// Result of a single backend call.
pub type CommandResult<T> = std::result::Result<T, CommandError>;
