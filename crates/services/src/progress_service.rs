use std::sync::{Arc, Mutex};

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::debug;

use quiz_core::model::StudentProgress;
use storage::{ProgressRepository, StorageError};

use crate::error::ProgressError;
use crate::events::SubmissionEvent;

/// Cached read model over the external student-progress contract.
///
/// The cache is dropped on every `ResultSubmitted` event so the next `load`
/// reflects the new attempt.
#[derive(Clone)]
pub struct ProgressService {
    repo: Arc<dyn ProgressRepository>,
    cache: Arc<Mutex<Option<StudentProgress>>>,
}

impl ProgressService {
    #[must_use]
    pub fn new(repo: Arc<dyn ProgressRepository>) -> Self {
        Self {
            repo,
            cache: Arc::new(Mutex::new(None)),
        }
    }

    /// Return cached progress, fetching it first if the cache is empty.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` on storage failures.
    pub async fn load(&self) -> Result<StudentProgress, ProgressError> {
        if let Some(progress) = self.cached()? {
            return Ok(progress);
        }
        self.refresh().await
    }

    /// Fetch progress from the system of record and replace the cache.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` on storage failures.
    pub async fn refresh(&self) -> Result<StudentProgress, ProgressError> {
        let progress = self.repo.fetch_student_progress().await?;
        let mut guard = self
            .cache
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(progress.clone());
        Ok(progress)
    }

    /// Drop the cached progress.
    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.cache.lock() {
            *guard = None;
        }
    }

    #[must_use]
    pub fn is_cached(&self) -> bool {
        self.cache.lock().is_ok_and(|guard| guard.is_some())
    }

    /// React to a submission event.
    pub fn apply_event(&self, event: &SubmissionEvent) {
        match event {
            SubmissionEvent::ResultSubmitted { quiz_id } => {
                debug!(%quiz_id, "progress cache invalidated");
                self.invalidate();
            }
        }
    }

    /// Invalidate the cache for every event received on `events` until the
    /// channel closes.
    #[must_use]
    pub fn spawn_invalidator(
        &self,
        mut events: broadcast::Receiver<SubmissionEvent>,
    ) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => service.apply_event(&event),
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "progress listener lagged");
                        service.invalidate();
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    fn cached(&self) -> Result<Option<StudentProgress>, ProgressError> {
        let guard = self
            .cache
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }
}
