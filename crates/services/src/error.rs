//! Shared error types for the services crate.

use std::time::Duration;

use thiserror::Error;

use quiz_core::model::ResultError;
use storage::StorageError;

/// Errors emitted by `QuizSession`.
///
/// Out-of-range answers indicate a caller bug rather than a user-facing failure.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,
    #[error("question position {position} out of range (session has {len})")]
    QuestionOutOfRange { position: usize, len: usize },
    #[error("option {option} out of range for question {position} ({len} options)")]
    OptionOutOfRange {
        position: usize,
        option: usize,
        len: usize,
    },
    #[error(transparent)]
    Result(#[from] ResultError),
}

/// Errors emitted by `SubmissionCoordinator`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubmissionError {
    #[error("a submission is already in flight")]
    AlreadySubmitting,
    #[error("quiz already submitted")]
    AlreadyCompleted,
    #[error("no submission is awaiting confirmation")]
    NotConfirming,
    #[error("only a failed submission can be retried")]
    NotRetryable,
    #[error("answers can only change before submission starts")]
    SessionLocked,
    #[error("submission timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Transport(#[from] StorageError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl SubmissionError {
    /// True when the attempt moved to `Failed` and `retry` may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Transport(_))
    }
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}
