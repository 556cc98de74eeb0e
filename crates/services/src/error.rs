//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{QuestionError, QuizSessionError};
use storage::repository::{SessionKey, StorageError};
use storage::sqlite::SqliteInitError;

use crate::route::Route;

/// Errors emitted by the quiz session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no active quiz session: {0} is missing")]
    MissingSessionState(SessionKey),
    #[error("persisted quiz session is malformed: {0}")]
    MalformedPersistedData(String),
    #[error("question index {index} out of range for {len} questions")]
    InvalidNavigationIndex { index: usize, len: usize },
    #[error("quiz session already completed")]
    Completed,
    #[error("quiz session has not been submitted yet")]
    NotCompleted,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// Where the taker should be sent after this error, if anywhere.
    ///
    /// Missing or corrupt state always falls back to setup. A rejected
    /// navigation keeps the taker on the current screen.
    #[must_use]
    pub fn route(&self) -> Option<Route> {
        match self {
            SessionError::MissingSessionState(_) | SessionError::MalformedPersistedData(_) => {
                Some(Route::Setup)
            }
            SessionError::Completed => Some(Route::Results),
            SessionError::NotCompleted => Some(Route::Quiz),
            SessionError::InvalidNavigationIndex { .. } | SessionError::Storage(_) => None,
        }
    }

    /// Load-time conversion: undecodable values are malformed data, not I/O failures.
    pub(crate) fn from_load(err: StorageError) -> Self {
        match err {
            StorageError::Serialization(msg) => SessionError::MalformedPersistedData(msg),
            other => SessionError::Storage(other),
        }
    }
}

impl From<QuizSessionError> for SessionError {
    fn from(err: QuizSessionError) -> Self {
        match err {
            QuizSessionError::IndexOutOfRange { index, len } => {
                SessionError::InvalidNavigationIndex { index, len }
            }
            QuizSessionError::Completed => SessionError::Completed,
            other => SessionError::MalformedPersistedData(other.to_string()),
        }
    }
}

/// Errors emitted while seeding a new session from the question source.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SetupError {
    #[error("taker identity must not be empty")]
    EmptyTaker,
    #[error("question source payload is invalid: {0}")]
    Source(#[from] serde_json::Error),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Session(#[from] QuizSessionError),
    #[error(transparent)]
    Persist(#[from] SessionError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
