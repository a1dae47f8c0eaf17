//! Events emitted by submission coordinators.

use tokio::sync::broadcast;

use quiz_core::model::QuizId;

/// Buffered events per receiver before slow readers start lagging.
pub const EVENT_CAPACITY: usize = 64;

/// Signals for read models that depend on submitted results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionEvent {
    /// The system of record accepted a result; cached progress is stale.
    ResultSubmitted { quiz_id: QuizId },
}

/// Create a sender/receiver pair for submission events.
#[must_use]
pub fn channel() -> (
    broadcast::Sender<SubmissionEvent>,
    broadcast::Receiver<SubmissionEvent>,
) {
    broadcast::channel(EVENT_CAPACITY)
}
