//! Errors surfaced by scheduler operations.

use thiserror::Error;

/// Failure of a scheduler request. Every variant leaves the aggregate unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// The request was malformed or referenced something that does not exist.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// An instance with this id exists but is not a weekly schedule.
    #[error("schedule [{0}] already exists with an incompatible type")]
    TypeConflict(String),

    /// A sunrise/sunset command needs the place's location.
    #[error("location required for sunrise/sunset scheduling")]
    LocationRequired,

    /// The solar provider could not produce sunrise/sunset times.
    #[error("sunrise/sunset calculation failed: {0}")]
    Solar(String),
}

impl SchedulerError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }
}

pub type Result<T, E = SchedulerError> = std::result::Result<T, E>;
