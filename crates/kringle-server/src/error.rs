//! Server error types.

use std::fmt;

use crate::{event_manager::EventError, executor::NotifyError, storage::StorageError};

/// Errors that can occur in the server and CLI.
#[derive(Debug)]
pub enum ServerError {
    /// Configuration error
    Config(String),

    /// File I/O error
    Io(String),

    /// Roster file could not be parsed or applied
    Roster(String),

    /// Event management error
    Event(EventError),

    /// Storage error
    Storage(StorageError),

    /// Notification error
    Notify(NotifyError),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Io(msg) => write!(f, "i/o error: {}", msg),
            Self::Roster(msg) => write!(f, "roster error: {}", msg),
            Self::Event(err) => write!(f, "{}", err),
            Self::Storage(err) => write!(f, "storage error: {}", err),
            Self::Notify(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Event(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::Notify(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EventError> for ServerError {
    fn from(err: EventError) -> Self {
        match err {
            EventError::Storage(inner) => Self::Storage(inner),
            other => Self::Event(other),
        }
    }
}

impl From<StorageError> for ServerError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

impl From<NotifyError> for ServerError {
    fn from(err: NotifyError) -> Self {
        Self::Notify(err)
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Roster(err.to_string())
    }
}
