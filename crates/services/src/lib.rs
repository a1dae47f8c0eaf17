#![forbid(unsafe_code)]

pub mod error;
pub mod events;
pub mod progress_service;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use error::{ProgressError, SessionError, SubmissionError};
pub use events::SubmissionEvent;
pub use progress_service::ProgressService;

pub use sessions::{
    ConfirmationPrompt, QuizLoopService, QuizSession, SessionProgress, SubmissionCoordinator,
    SubmissionState, SubmitOutcome,
};
