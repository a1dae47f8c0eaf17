use async_trait::async_trait;
use quiz_core::Clock;
use quiz_core::model::{DocumentRef, QuizId, ResultSummary, Score, StudentProgress};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("request timed out")]
    Timeout,

    #[error("rejected: {0}")]
    Rejected(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Read access to document metadata owned by the document store.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Fetch the examination-board tag attached to a document, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the document is unknown, or other storage errors.
    async fn fetch_variant_tag(&self, document: &DocumentRef)
    -> Result<Option<String>, StorageError>;
}

/// Write side of the system of record for quiz results.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Record a graded attempt.
    ///
    /// Resubmitting the same `quiz_id` is expected to be an idempotent upsert.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be recorded; callers may retry.
    async fn submit_result(
        &self,
        quiz_id: &QuizId,
        correct_answers: u32,
        total_questions: u32,
    ) -> Result<(), StorageError>;
}

/// Read side of the system of record for student progress.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the current student's progress.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if progress cannot be read.
    async fn fetch_student_progress(&self) -> Result<StudentProgress, StorageError>;
}

/// In-memory stand-in for the document store and system of record.
///
/// Aggregation rules (owned by the real system of record, mirrored here only
/// for tests and prototyping): best is the highest percentage with the
/// earliest attempt winning ties, and the average is the arithmetic mean of
/// all recorded percentages.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    clock: Clock,
    documents: Arc<Mutex<HashMap<DocumentRef, Option<String>>>>,
    results: Arc<Mutex<Vec<ResultSummary>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `clock` to timestamp recorded results.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Register a document and its optional board tag.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the store lock is poisoned.
    pub fn insert_document(
        &self,
        document: DocumentRef,
        tag: Option<String>,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .documents
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(document, tag);
        Ok(())
    }

    /// Number of distinct results recorded so far.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the store lock is poisoned.
    pub fn result_count(&self) -> Result<usize, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.len())
    }
}

#[async_trait]
impl DocumentRepository for InMemoryRepository {
    async fn fetch_variant_tag(
        &self,
        document: &DocumentRef,
    ) -> Result<Option<String>, StorageError> {
        let guard = self
            .documents
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(document).cloned().ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl ResultRepository for InMemoryRepository {
    async fn submit_result(
        &self,
        quiz_id: &QuizId,
        correct_answers: u32,
        total_questions: u32,
    ) -> Result<(), StorageError> {
        let score = Score {
            correct: correct_answers,
            total: total_questions,
        };
        let summary = ResultSummary::from_score(quiz_id.clone(), score, self.clock.now())
            .map_err(|e| StorageError::Rejected(e.to_string()))?;

        let mut guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        match guard.iter_mut().find(|r| r.quiz_id() == quiz_id) {
            Some(existing) => *existing = summary,
            None => guard.push(summary),
        }
        Ok(())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn fetch_student_progress(&self) -> Result<StudentProgress, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let history = guard.clone();
        drop(guard);

        let mut best: Option<&ResultSummary> = None;
        for result in &history {
            if best.is_none_or(|b| result.percentage() > b.percentage()) {
                best = Some(result);
            }
        }
        let best = best.cloned();

        let attempt_count = u32::try_from(history.len())
            .map_err(|_| StorageError::Serialization("attempt count overflow".into()))?;
        let average = if history.is_empty() {
            0.0
        } else {
            history.iter().map(ResultSummary::percentage).sum::<f64>() / f64::from(attempt_count)
        };

        Ok(StudentProgress::from_persisted(
            best,
            average,
            history,
            attempt_count,
        ))
    }
}

/// Aggregates the external contracts behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub documents: Arc<dyn DocumentRepository>,
    pub results: Arc<dyn ResultRepository>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    /// Share one in-memory repository across all three contracts.
    #[must_use]
    pub fn from_repository(repo: InMemoryRepository) -> Self {
        let documents: Arc<dyn DocumentRepository> = Arc::new(repo.clone());
        let results: Arc<dyn ResultRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo);
        Self {
            documents,
            results,
            progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::Grade;
    use quiz_core::time::fixed_clock;

    fn quiz_id(id: &str) -> QuizId {
        QuizId::from_persisted(id)
    }

    #[tokio::test]
    async fn returns_document_tag_or_not_found() {
        let repo = InMemoryRepository::new();
        let doc = DocumentRef::new("doc-1").unwrap();
        repo.insert_document(doc.clone(), Some("ABMA".into()))
            .unwrap();

        assert_eq!(
            repo.fetch_variant_tag(&doc).await.unwrap(),
            Some("ABMA".to_string())
        );
        let missing = DocumentRef::new("doc-2").unwrap();
        assert_eq!(
            repo.fetch_variant_tag(&missing).await,
            Err(StorageError::NotFound)
        );
    }

    #[tokio::test]
    async fn aggregates_progress_from_history() {
        let repo = InMemoryRepository::new().with_clock(fixed_clock());
        repo.submit_result(&quiz_id("a"), 6, 10).await.unwrap();
        repo.submit_result(&quiz_id("b"), 9, 10).await.unwrap();
        repo.submit_result(&quiz_id("c"), 9, 10).await.unwrap();

        let progress = repo.fetch_student_progress().await.unwrap();
        assert_eq!(progress.attempt_count(), 3);
        assert_eq!(progress.history().len(), 3);
        let best = progress.best_result().unwrap();
        assert_eq!(best.quiz_id(), &quiz_id("b"));
        assert_eq!(best.grade(), Grade::A);
        assert!((progress.average_percentage() - 80.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn resubmitting_same_quiz_id_replaces_entry() {
        let repo = InMemoryRepository::new();
        repo.submit_result(&quiz_id("a"), 3, 10).await.unwrap();
        repo.submit_result(&quiz_id("a"), 3, 10).await.unwrap();

        assert_eq!(repo.result_count().unwrap(), 1);
        let progress = repo.fetch_student_progress().await.unwrap();
        assert_eq!(progress.attempt_count(), 1);
    }

    #[tokio::test]
    async fn rejects_inconsistent_counts() {
        let repo = InMemoryRepository::new();
        let err = repo.submit_result(&quiz_id("a"), 4, 0).await.unwrap_err();
        assert!(matches!(err, StorageError::Rejected(_)));
        assert!(
            !repo
                .fetch_student_progress()
                .await
                .unwrap()
                .has_attempts()
        );
    }

    #[test]
    fn storage_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Storage>();
        assert_send_sync::<InMemoryRepository>();
    }
}
