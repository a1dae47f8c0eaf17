mod progress;
mod service;
mod submission;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::{SessionError, SubmissionError};
pub use progress::SessionProgress;
pub use service::QuizSession;
pub use submission::{
    ConfirmationPrompt, SubmissionCoordinator, SubmissionState, SubmitOutcome,
    UNANSWERED_CONSEQUENCE,
};
pub use workflow::QuizLoopService;
