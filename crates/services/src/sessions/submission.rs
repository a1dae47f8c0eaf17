use std::fmt;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use quiz_core::Clock;
use quiz_core::model::{QuizId, QuizIdGenerator, QuizSettings, ResultSummary, ReviewEntry};
use storage::{ResultRepository, StorageError};

use super::service::QuizSession;
use crate::error::SubmissionError;
use crate::events::SubmissionEvent;

/// Consequence shown whenever a quiz is submitted with gaps.
pub const UNANSWERED_CONSEQUENCE: &str = "Unanswered questions will be marked as incorrect.";

//
// ─── STATES ────────────────────────────────────────────────────────────────────
//

/// Warning presented before submitting a partially answered quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationPrompt {
    pub answered: usize,
    pub total: usize,
    pub unanswered: usize,
}

impl ConfirmationPrompt {
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "You have answered {} out of {} questions. {UNANSWERED_CONSEQUENCE}",
            self.answered, self.total
        )
    }
}

/// Lifecycle of one submission attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionState {
    /// Answering and navigating.
    Composing,
    /// Waiting for the user to accept submitting with unanswered questions.
    Confirming(ConfirmationPrompt),
    /// External call in flight.
    Submitting { quiz_id: QuizId },
    /// Accepted by the system of record.
    Completed(ResultSummary),
    /// External call failed or timed out; `retry` resubmits the same attempt.
    Failed {
        summary: ResultSummary,
        reason: StorageError,
    },
}

impl SubmissionState {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Composing => "composing",
            Self::Confirming(_) => "confirming",
            Self::Submitting { .. } => "submitting",
            Self::Completed(_) => "completed",
            Self::Failed { .. } => "failed",
        }
    }
}

/// What a submit request led to.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Some questions are unanswered; call `confirm` or `cancel`.
    NeedsConfirmation(ConfirmationPrompt),
    /// The result was recorded.
    Completed(ResultSummary),
}

//
// ─── COORDINATOR ───────────────────────────────────────────────────────────────
//

/// Owns one quiz session and drives it through confirmation and submission.
///
/// The attempt is graded once, when submission first starts; the quiz id and
/// summary are then reused by every retry so the system of record can treat a
/// resubmission as an upsert.
pub struct SubmissionCoordinator {
    session: QuizSession,
    state: SubmissionState,
    attempt: Option<ResultSummary>,
    results: Arc<dyn ResultRepository>,
    clock: Clock,
    settings: QuizSettings,
    events: broadcast::Sender<SubmissionEvent>,
}

impl SubmissionCoordinator {
    #[must_use]
    pub fn new(
        session: QuizSession,
        results: Arc<dyn ResultRepository>,
        clock: Clock,
        events: broadcast::Sender<SubmissionEvent>,
    ) -> Self {
        Self {
            session,
            state: SubmissionState::Composing,
            attempt: None,
            results,
            clock,
            settings: QuizSettings::default(),
            events,
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: QuizSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    /// Mutable access to the session for navigation and answering.
    ///
    /// # Errors
    ///
    /// Returns `SubmissionError::SessionLocked` unless the coordinator is composing.
    pub fn session_mut(&mut self) -> Result<&mut QuizSession, SubmissionError> {
        match self.state {
            SubmissionState::Composing => Ok(&mut self.session),
            _ => Err(SubmissionError::SessionLocked),
        }
    }

    /// Graded attempt, available once submission has started.
    #[must_use]
    pub fn result(&self) -> Option<&ResultSummary> {
        self.attempt.as_ref()
    }

    #[must_use]
    pub fn quiz_id(&self) -> Option<&QuizId> {
        self.attempt.as_ref().map(ResultSummary::quiz_id)
    }

    /// Reason for the last failed submission, if the attempt is in `Failed`.
    #[must_use]
    pub fn failure(&self) -> Option<&StorageError> {
        match &self.state {
            SubmissionState::Failed { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// Review of the graded attempt, available once submission has started.
    #[must_use]
    pub fn review(&self) -> Option<Vec<ReviewEntry>> {
        self.attempt.as_ref().map(|_| self.session.review())
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self.state, SubmissionState::Completed(_))
    }

    /// Ask to submit the quiz.
    ///
    /// Fully answered quizzes are submitted right away; otherwise the
    /// coordinator moves to `Confirming` and returns the prompt. Asking again
    /// while confirming returns the same prompt; asking after a failure retries.
    ///
    /// # Errors
    ///
    /// Returns `AlreadySubmitting` while a call is in flight, `AlreadyCompleted`
    /// after success, and `Transport`/`Timeout` if the external call fails.
    pub async fn request_submit(&mut self) -> Result<SubmitOutcome, SubmissionError> {
        match &self.state {
            SubmissionState::Composing => {
                if self.session.is_fully_answered() {
                    self.submit().await.map(SubmitOutcome::Completed)
                } else {
                    let prompt = ConfirmationPrompt {
                        answered: self.session.answered_count(),
                        total: self.session.total_questions(),
                        unanswered: self.session.unanswered_count(),
                    };
                    debug!(unanswered = prompt.unanswered, "submit needs confirmation");
                    self.state = SubmissionState::Confirming(prompt.clone());
                    Ok(SubmitOutcome::NeedsConfirmation(prompt))
                }
            }
            SubmissionState::Confirming(prompt) => {
                Ok(SubmitOutcome::NeedsConfirmation(prompt.clone()))
            }
            SubmissionState::Submitting { .. } => Err(SubmissionError::AlreadySubmitting),
            SubmissionState::Completed(_) => Err(SubmissionError::AlreadyCompleted),
            SubmissionState::Failed { .. } => self.retry().await,
        }
    }

    /// Accept the unanswered-questions warning and submit.
    ///
    /// # Errors
    ///
    /// Returns `NotConfirming` outside `Confirming`, and `Transport`/`Timeout`
    /// if the external call fails.
    pub async fn confirm(&mut self) -> Result<SubmitOutcome, SubmissionError> {
        if !matches!(self.state, SubmissionState::Confirming(_)) {
            return Err(SubmissionError::NotConfirming);
        }
        self.submit().await.map(SubmitOutcome::Completed)
    }

    /// Dismiss the warning and go back to answering. The session is untouched.
    ///
    /// # Errors
    ///
    /// Returns `NotConfirming` outside `Confirming`.
    pub fn cancel(&mut self) -> Result<(), SubmissionError> {
        if !matches!(self.state, SubmissionState::Confirming(_)) {
            return Err(SubmissionError::NotConfirming);
        }
        debug!("submit confirmation cancelled");
        self.state = SubmissionState::Composing;
        Ok(())
    }

    /// Resubmit a failed attempt with its original quiz id.
    ///
    /// # Errors
    ///
    /// Returns `NotRetryable` unless the attempt is in `Failed`, and
    /// `Transport`/`Timeout` if the external call fails again.
    pub async fn retry(&mut self) -> Result<SubmitOutcome, SubmissionError> {
        if !matches!(self.state, SubmissionState::Failed { .. }) {
            return Err(SubmissionError::NotRetryable);
        }
        self.submit().await.map(SubmitOutcome::Completed)
    }

    fn graded_attempt(&mut self) -> Result<ResultSummary, SubmissionError> {
        if let Some(summary) = &self.attempt {
            return Ok(summary.clone());
        }
        let quiz_id = QuizIdGenerator::global().generate(
            self.settings.quiz_id_prefix(),
            self.session.document(),
            &self.clock,
        );
        let summary = self.session.grade(quiz_id, self.clock.now())?;
        self.attempt = Some(summary.clone());
        Ok(summary)
    }

    #[instrument(skip(self), fields(document = %self.session.document()))]
    async fn submit(&mut self) -> Result<ResultSummary, SubmissionError> {
        let summary = self.graded_attempt()?;
        let quiz_id = summary.quiz_id().clone();
        debug!(%quiz_id, "submitting result");

        let results = Arc::clone(&self.results);
        let timeout = self.settings.submit_timeout();
        let in_flight = InFlight::start(&mut self.state, summary.clone());
        let call = results.submit_result(
            &quiz_id,
            summary.correct_answers(),
            summary.total_questions(),
        );

        let (reason, error) = match tokio::time::timeout(timeout, call).await {
            Ok(Ok(())) => {
                info!(
                    %quiz_id,
                    correct = summary.correct_answers(),
                    total = summary.total_questions(),
                    grade = %summary.grade(),
                    "quiz result submitted"
                );
                in_flight.finish(SubmissionState::Completed(summary.clone()));
                if self
                    .events
                    .send(SubmissionEvent::ResultSubmitted { quiz_id })
                    .is_err()
                {
                    debug!("no progress listeners for submission event");
                }
                return Ok(summary);
            }
            Ok(Err(e)) => (e.clone(), SubmissionError::Transport(e)),
            Err(_) => (StorageError::Timeout, SubmissionError::Timeout(timeout)),
        };

        warn!(%quiz_id, error = %error, "quiz result submission failed");
        in_flight.finish(SubmissionState::Failed { summary, reason });
        Err(error)
    }
}

/// Holds the coordinator in `Submitting` for the duration of the external call.
///
/// If the submit future is dropped before the call settles, the attempt lands
/// in `Failed` so it can be retried with the same quiz id.
struct InFlight<'a> {
    state: &'a mut SubmissionState,
    pending: Option<ResultSummary>,
}

impl<'a> InFlight<'a> {
    fn start(state: &'a mut SubmissionState, summary: ResultSummary) -> Self {
        *state = SubmissionState::Submitting {
            quiz_id: summary.quiz_id().clone(),
        };
        Self {
            state,
            pending: Some(summary),
        }
    }

    fn finish(mut self, next: SubmissionState) {
        self.pending = None;
        *self.state = next;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(summary) = self.pending.take() {
            warn!(quiz_id = %summary.quiz_id(), "quiz result submission cancelled");
            *self.state = SubmissionState::Failed {
                summary,
                reason: StorageError::Connection("submission cancelled".into()),
            };
        }
    }
}

impl fmt::Debug for SubmissionCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionCoordinator")
            .field("session", &self.session)
            .field("state", &self.state.name())
            .field("quiz_id", &self.quiz_id())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quiz_core::model::{DocumentRef, Grade, Question};
    use quiz_core::time::{fixed_clock, fixed_now};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records calls and fails the first `failures` of them.
    #[derive(Default)]
    struct ScriptedResults {
        failures: Mutex<usize>,
        calls: Mutex<Vec<(QuizId, u32, u32)>>,
    }

    impl ScriptedResults {
        fn failing(times: usize) -> Self {
            Self {
                failures: Mutex::new(times),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(QuizId, u32, u32)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ResultRepository for ScriptedResults {
        async fn submit_result(
            &self,
            quiz_id: &QuizId,
            correct_answers: u32,
            total_questions: u32,
        ) -> Result<(), StorageError> {
            self.calls
                .lock()
                .unwrap()
                .push((quiz_id.clone(), correct_answers, total_questions));
            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(StorageError::Connection("offline".into()));
            }
            Ok(())
        }
    }

    /// Never answers.
    struct StalledResults;

    #[async_trait]
    impl ResultRepository for StalledResults {
        async fn submit_result(&self, _: &QuizId, _: u32, _: u32) -> Result<(), StorageError> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    /// Never answers the first call; records and accepts every later one.
    #[derive(Default)]
    struct StallsOnce {
        calls: Mutex<Vec<QuizId>>,
    }

    impl StallsOnce {
        fn calls(&self) -> Vec<QuizId> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ResultRepository for StallsOnce {
        async fn submit_result(&self, quiz_id: &QuizId, _: u32, _: u32) -> Result<(), StorageError> {
            let first = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(quiz_id.clone());
                calls.len() == 1
            };
            if first {
                std::future::pending::<()>().await;
            }
            Ok(())
        }
    }

    fn build_session(len: usize) -> QuizSession {
        let questions = (0..len)
            .map(|i| {
                let options = vec!["a".into(), "b".into(), "c".into(), "d".into()];
                Question::new(i.to_string(), format!("Q{i}"), options, 0).unwrap()
            })
            .collect();
        QuizSession::from_questions(DocumentRef::new("doc-1").unwrap(), questions, fixed_now())
            .unwrap()
    }

    fn coordinator(
        len: usize,
        results: Arc<dyn ResultRepository>,
    ) -> (SubmissionCoordinator, broadcast::Receiver<SubmissionEvent>) {
        let (tx, rx) = crate::events::channel();
        let coordinator = SubmissionCoordinator::new(build_session(len), results, fixed_clock(), tx);
        (coordinator, rx)
    }

    fn answer_all(coordinator: &mut SubmissionCoordinator, correct: usize) {
        let session = coordinator.session_mut().unwrap();
        for position in 0..session.total_questions() {
            let option = usize::from(position >= correct);
            session.record_answer(position, option).unwrap();
        }
    }

    #[tokio::test]
    async fn fully_answered_submits_without_confirmation() {
        let results = Arc::new(ScriptedResults::default());
        let (mut coordinator, mut rx) = coordinator(10, results.clone());
        answer_all(&mut coordinator, 7);

        let outcome = coordinator.request_submit().await.unwrap();
        let SubmitOutcome::Completed(summary) = outcome else {
            panic!("expected completion");
        };
        assert_eq!(summary.correct_answers(), 7);
        assert_eq!(summary.grade(), Grade::C);
        assert!(coordinator.is_completed());

        let calls = results.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!((calls[0].1, calls[0].2), (7, 10));

        let event = rx.try_recv().unwrap();
        assert_eq!(
            event,
            SubmissionEvent::ResultSubmitted {
                quiz_id: summary.quiz_id().clone()
            }
        );
    }

    #[tokio::test]
    async fn partial_answers_require_confirmation() {
        let results = Arc::new(ScriptedResults::default());
        let (mut coordinator, _rx) = coordinator(4, results.clone());
        coordinator.session_mut().unwrap().record_answer(0, 0).unwrap();

        let outcome = coordinator.request_submit().await.unwrap();
        let SubmitOutcome::NeedsConfirmation(prompt) = outcome else {
            panic!("expected confirmation");
        };
        assert_eq!(prompt.unanswered, 3);
        assert!(prompt.message().contains("1 out of 4"));
        assert!(prompt.message().ends_with(UNANSWERED_CONSEQUENCE));
        assert!(results.calls().is_empty());
        assert!(matches!(
            coordinator.session_mut(),
            Err(SubmissionError::SessionLocked)
        ));

        let again = coordinator.request_submit().await.unwrap();
        assert_eq!(again, SubmitOutcome::NeedsConfirmation(prompt));
    }

    #[tokio::test]
    async fn cancel_returns_to_composing_with_answers_intact() {
        let results = Arc::new(ScriptedResults::default());
        let (mut coordinator, _rx) = coordinator(3, results.clone());
        coordinator.session_mut().unwrap().record_answer(1, 2).unwrap();

        coordinator.request_submit().await.unwrap();
        coordinator.cancel().unwrap();

        assert_eq!(coordinator.state(), &SubmissionState::Composing);
        assert_eq!(coordinator.session().selected_option(1), Some(2));
        assert!(coordinator.result().is_none());
        assert!(results.calls().is_empty());
        assert!(matches!(
            coordinator.cancel(),
            Err(SubmissionError::NotConfirming)
        ));
    }

    #[tokio::test]
    async fn confirming_unanswered_quiz_scores_zero() {
        let results = Arc::new(ScriptedResults::default());
        let (mut coordinator, _rx) = coordinator(10, results.clone());

        coordinator.request_submit().await.unwrap();
        let SubmitOutcome::Completed(summary) = coordinator.confirm().await.unwrap() else {
            panic!("expected completion");
        };
        assert_eq!(summary.correct_answers(), 0);
        assert_eq!(summary.total_questions(), 10);
        assert!(summary.percentage().abs() < f64::EPSILON);
        assert_eq!(summary.grade(), Grade::F);
    }

    #[tokio::test]
    async fn confirm_outside_confirming_is_rejected() {
        let results = Arc::new(ScriptedResults::default());
        let (mut coordinator, _rx) = coordinator(2, results);
        assert!(matches!(
            coordinator.confirm().await,
            Err(SubmissionError::NotConfirming)
        ));
        assert!(matches!(
            coordinator.retry().await,
            Err(SubmissionError::NotRetryable)
        ));
    }

    #[tokio::test]
    async fn failed_submission_keeps_attempt_and_retries_with_same_id() {
        let results = Arc::new(ScriptedResults::failing(1));
        let (mut coordinator, mut rx) = coordinator(5, results.clone());
        answer_all(&mut coordinator, 4);
        let answers_before = coordinator.session().answers().clone();

        let err = coordinator.request_submit().await.unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(
            coordinator.state(),
            SubmissionState::Failed { .. }
        ));
        assert!(matches!(
            coordinator.failure(),
            Some(StorageError::Connection(_))
        ));
        assert_eq!(coordinator.session().answers(), &answers_before);
        assert!(rx.try_recv().is_err());
        let first_id = coordinator.quiz_id().cloned().unwrap();

        let outcome = coordinator.retry().await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Completed(_)));
        assert!(coordinator.is_completed());
        assert_eq!(coordinator.session().answers(), &answers_before);

        let calls = results.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, first_id);
        assert_eq!(calls[1].0, first_id);
        assert!(matches!(
            coordinator.request_submit().await,
            Err(SubmissionError::AlreadyCompleted)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_moves_to_failed() {
        let (mut coordinator, _rx) = coordinator(1, Arc::new(StalledResults));
        coordinator = coordinator
            .with_settings(QuizSettings::default().with_submit_timeout(Duration::from_secs(2)));
        answer_all(&mut coordinator, 1);

        let err = coordinator.request_submit().await.unwrap_err();
        assert!(matches!(err, SubmissionError::Timeout(d) if d == Duration::from_secs(2)));
        assert!(matches!(coordinator.failure(), Some(StorageError::Timeout)));
        assert!(coordinator.result().is_some());
        assert!(coordinator.review().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_submission_fails_and_retries_with_same_id() {
        let results = Arc::new(StallsOnce::default());
        let (mut coordinator, mut rx) = coordinator(2, results.clone());
        answer_all(&mut coordinator, 2);

        let pending =
            tokio::time::timeout(Duration::from_millis(10), coordinator.request_submit()).await;
        assert!(pending.is_err());
        assert!(matches!(
            coordinator.failure(),
            Some(StorageError::Connection(_))
        ));
        assert!(rx.try_recv().is_err());
        let quiz_id = coordinator.quiz_id().cloned().unwrap();

        let outcome = coordinator.retry().await.unwrap();
        let SubmitOutcome::Completed(summary) = outcome else {
            panic!("expected completion");
        };
        assert_eq!(summary.quiz_id(), &quiz_id);
        assert_eq!(results.calls(), vec![quiz_id.clone(), quiz_id]);
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn coordinators_on_same_document_get_distinct_ids() {
        let results = Arc::new(ScriptedResults::default());
        let (mut first, _rx1) = coordinator(1, results.clone());
        let (mut second, _rx2) = coordinator(1, results.clone());
        answer_all(&mut first, 1);
        answer_all(&mut second, 1);

        first.request_submit().await.unwrap();
        second.request_submit().await.unwrap();

        assert_ne!(first.quiz_id(), second.quiz_id());
        let calls = results.calls();
        assert_ne!(calls[0].0, calls[1].0);
    }
}
