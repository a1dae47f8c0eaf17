use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{info, warn};

use quiz_core::Clock;
use quiz_core::model::{DocumentRef, QuestionBank, QuizSettings};
use storage::{DocumentRepository, ResultRepository, Storage};

use super::service::QuizSession;
use super::submission::SubmissionCoordinator;
use crate::error::SessionError;
use crate::events::{self, SubmissionEvent};

/// Orchestrates quiz start: board lookup, variant selection and coordinator wiring.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    settings: QuizSettings,
    bank: Arc<QuestionBank>,
    documents: Arc<dyn DocumentRepository>,
    results: Arc<dyn ResultRepository>,
    events: broadcast::Sender<SubmissionEvent>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        bank: Arc<QuestionBank>,
        documents: Arc<dyn DocumentRepository>,
        results: Arc<dyn ResultRepository>,
    ) -> Self {
        let (events, _) = events::channel();
        Self {
            clock,
            settings: QuizSettings::default(),
            bank,
            documents,
            results,
            events,
        }
    }

    /// Wire the loop to the document and result contracts of `storage`.
    #[must_use]
    pub fn from_storage(clock: Clock, bank: Arc<QuestionBank>, storage: &Storage) -> Self {
        Self::new(
            clock,
            bank,
            Arc::clone(&storage.documents),
            Arc::clone(&storage.results),
        )
    }

    #[must_use]
    pub fn with_settings(mut self, settings: QuizSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    /// Receive `SubmissionEvent`s from every coordinator this loop creates.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SubmissionEvent> {
        self.events.subscribe()
    }

    /// Start a fresh attempt on `document`.
    ///
    /// A failed board lookup is treated like a document without a board.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if the selected variant has no questions.
    pub async fn start_quiz(
        &self,
        document: DocumentRef,
    ) -> Result<SubmissionCoordinator, SessionError> {
        let tag = match self.documents.fetch_variant_tag(&document).await {
            Ok(tag) => tag,
            Err(err) => {
                warn!(%document, error = %err, "board lookup failed, using default questions");
                None
            }
        };

        let variant = self.bank.select(tag.as_deref());
        if tag.is_some() && variant.tag().is_none() {
            warn!(%document, tag = ?tag, "unknown board tag, using default questions");
        }

        let session = QuizSession::new(document, variant, self.clock.now())?;
        info!(
            document = %session.document(),
            variant = session.variant_tag().unwrap_or("default"),
            questions = session.total_questions(),
            "quiz started"
        );

        Ok(SubmissionCoordinator::new(
            session,
            Arc::clone(&self.results),
            self.clock,
            self.events.clone(),
        )
        .with_settings(self.settings.clone()))
    }
}
