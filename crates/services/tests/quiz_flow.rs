use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::model::{DocumentRef, Grade, QuestionBank, QuizId, Verdict};
use quiz_core::time::fixed_clock;
use services::{
    ProgressService, QuizLoopService, SubmissionCoordinator, SubmissionState, SubmitOutcome,
};
use storage::repository::{InMemoryRepository, ResultRepository, Storage, StorageError};

/// Fails the first `remaining` submissions, then forwards to the inner repository.
struct FlakyResults {
    inner: InMemoryRepository,
    remaining: AtomicUsize,
}

#[async_trait]
impl ResultRepository for FlakyResults {
    async fn submit_result(
        &self,
        quiz_id: &QuizId,
        correct_answers: u32,
        total_questions: u32,
    ) -> Result<(), StorageError> {
        if self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(StorageError::Connection("network unreachable".into()));
        }
        self.inner
            .submit_result(quiz_id, correct_answers, total_questions)
            .await
    }
}

fn bank() -> Arc<QuestionBank> {
    Arc::new(QuestionBank::builtin().unwrap())
}

fn answer(coordinator: &mut SubmissionCoordinator, correct: usize) {
    let session = coordinator.session_mut().unwrap();
    for position in 0..session.total_questions() {
        let right = session.questions()[position].correct_option();
        let option = if position < correct { right } else { (right + 1) % 4 };
        session.jump_to(position);
        session.answer_current(option).unwrap();
    }
}

#[tokio::test]
async fn seven_of_ten_grades_c_and_updates_progress() {
    let repo = InMemoryRepository::new().with_clock(fixed_clock());
    let storage = Storage::from_repository(repo.clone());
    let doc = DocumentRef::new("economics-notes").unwrap();
    repo.insert_document(doc.clone(), None).unwrap();

    let loop_svc = QuizLoopService::from_storage(fixed_clock(), bank(), &storage);
    let progress = ProgressService::new(Arc::clone(&storage.progress));
    let listener = progress.spawn_invalidator(loop_svc.subscribe());
    assert_eq!(progress.load().await.unwrap().attempt_count(), 0);

    let mut coordinator = loop_svc.start_quiz(doc).await.unwrap();
    answer(&mut coordinator, 7);

    let SubmitOutcome::Completed(summary) = coordinator.request_submit().await.unwrap() else {
        panic!("fully answered quiz should submit directly");
    };
    assert_eq!(summary.correct_answers(), 7);
    assert_eq!(summary.total_questions(), 10);
    assert!((summary.percentage() - 70.0).abs() < f64::EPSILON);
    assert_eq!(summary.grade(), Grade::C);
    assert_eq!(summary.feedback(), Grade::C.feedback());

    let review = coordinator.review().unwrap();
    assert_eq!(
        review.iter().filter(|e| e.verdict == Verdict::Correct).count(),
        7
    );

    drop(loop_svc);
    drop(coordinator);
    listener.await.unwrap();

    let refreshed = progress.load().await.unwrap();
    assert_eq!(refreshed.attempt_count(), 1);
    assert_eq!(refreshed.best_result().unwrap().quiz_id(), summary.quiz_id());
}

#[tokio::test]
async fn abma_board_gets_abma_questions() {
    let repo = InMemoryRepository::new();
    let storage = Storage::from_repository(repo.clone());
    let abma_doc = DocumentRef::new("abma-pack").unwrap();
    let other_doc = DocumentRef::new("other-pack").unwrap();
    repo.insert_document(abma_doc.clone(), Some("ABMA".into()))
        .unwrap();
    repo.insert_document(other_doc.clone(), Some("Unknown".into()))
        .unwrap();

    let bank = bank();
    let loop_svc = QuizLoopService::from_storage(fixed_clock(), Arc::clone(&bank), &storage);

    let abma = loop_svc.start_quiz(abma_doc).await.unwrap();
    assert_eq!(
        abma.session().questions(),
        bank.select_questions(Some("ABMA"))
    );

    let other = loop_svc.start_quiz(other_doc).await.unwrap();
    assert_eq!(
        other.session().questions(),
        bank.default_variant().questions()
    );
}

#[tokio::test]
async fn transport_failure_then_retry_completes_without_losing_answers() {
    let repo = InMemoryRepository::new();
    let doc = DocumentRef::new("doc-retry").unwrap();
    repo.insert_document(doc.clone(), None).unwrap();
    let flaky = Arc::new(FlakyResults {
        inner: repo.clone(),
        remaining: AtomicUsize::new(1),
    });

    let loop_svc = QuizLoopService::new(fixed_clock(), bank(), Arc::new(repo.clone()), flaky);
    let mut coordinator = loop_svc.start_quiz(doc).await.unwrap();
    answer(&mut coordinator, 9);
    let before = coordinator.session().answers().clone();

    let err = coordinator.request_submit().await.unwrap_err();
    assert!(err.is_retryable());
    assert!(matches!(
        coordinator.state(),
        SubmissionState::Failed { .. }
    ));
    assert_eq!(coordinator.session().answers(), &before);
    let quiz_id = coordinator.quiz_id().cloned().unwrap();

    coordinator.retry().await.unwrap();
    assert!(coordinator.is_completed());
    assert_eq!(coordinator.session().answers(), &before);
    assert_eq!(coordinator.quiz_id(), Some(&quiz_id));
    assert_eq!(repo.result_count().unwrap(), 1);
}

#[tokio::test]
async fn confirmed_empty_quiz_scores_f() {
    let storage = Storage::in_memory();
    let loop_svc = QuizLoopService::from_storage(fixed_clock(), bank(), &storage);
    let mut coordinator = loop_svc
        .start_quiz(DocumentRef::new("doc-empty").unwrap())
        .await
        .unwrap();

    let outcome = coordinator.request_submit().await.unwrap();
    let SubmitOutcome::NeedsConfirmation(prompt) = outcome else {
        panic!("unanswered quiz must ask for confirmation");
    };
    assert_eq!(prompt.unanswered, 10);
    assert!(matches!(coordinator.state(), SubmissionState::Confirming(_)));

    let SubmitOutcome::Completed(summary) = coordinator.confirm().await.unwrap() else {
        panic!("confirmed quiz should complete");
    };
    assert_eq!(summary.correct_answers(), 0);
    assert_eq!(summary.total_questions(), 10);
    assert!(summary.percentage().abs() < f64::EPSILON);
    assert_eq!(summary.grade(), Grade::F);
}

#[tokio::test]
async fn back_to_back_attempts_on_same_document_get_distinct_ids() {
    let storage = Storage::in_memory();
    let loop_svc = QuizLoopService::from_storage(fixed_clock(), bank(), &storage);
    let doc = DocumentRef::new("doc-same").unwrap();

    let mut ids = HashSet::new();
    for _ in 0..5 {
        let mut coordinator = loop_svc.start_quiz(doc.clone()).await.unwrap();
        answer(&mut coordinator, 10);
        coordinator.request_submit().await.unwrap();
        ids.insert(coordinator.quiz_id().cloned().unwrap());
    }
    assert_eq!(ids.len(), 5);
}
