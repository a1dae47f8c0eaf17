use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;

use quiz_core::model::{
    AnswerSheet, DocumentRef, Question, QuizId, ResultSummary, ReviewEntry, VariantSet,
    build_report, grade,
};

use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory quiz attempt: an ordered question list, a cursor and the answers so far.
///
/// Cursor movement never fails; out-of-range moves are clamped or ignored.
/// The cursor always satisfies `0 <= cursor < questions.len()`.
#[derive(Clone)]
pub struct QuizSession {
    document: DocumentRef,
    variant_tag: Option<String>,
    questions: Vec<Question>,
    cursor: usize,
    answers: AnswerSheet,
    started_at: DateTime<Utc>,
}

impl QuizSession {
    /// Start a session over the questions of `variant`.
    ///
    /// `started_at` should come from the services layer clock to keep time deterministic.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if the variant has no questions.
    pub fn new(
        document: DocumentRef,
        variant: &VariantSet,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let mut session =
            Self::from_questions(document, variant.questions().to_vec(), started_at)?;
        session.variant_tag = variant.tag().map(str::to_owned);
        Ok(session)
    }

    /// Start a session over an explicit question list.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if `questions` is empty.
    pub fn from_questions(
        document: DocumentRef,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }
        Ok(Self {
            document,
            variant_tag: None,
            questions,
            cursor: 0,
            answers: AnswerSheet::new(),
            started_at,
        })
    }

    #[must_use]
    pub fn document(&self) -> &DocumentRef {
        &self.document
    }

    /// Board tag of the variant in use, `None` for the default set.
    #[must_use]
    pub fn variant_tag(&self) -> Option<&str> {
        self.variant_tag.as_deref()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    /// Total number of questions in this session.
    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.questions[self.cursor]
    }

    #[must_use]
    pub fn is_first(&self) -> bool {
        self.cursor == 0
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.cursor + 1 == self.questions.len()
    }

    // ─── Navigation ───

    /// Move to the next question; stays put on the last one.
    pub fn advance(&mut self) {
        if !self.is_last() {
            self.cursor += 1;
        }
    }

    /// Move to the previous question; stays put on the first one.
    pub fn retreat(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Jump to `position` if it exists. Returns whether the cursor moved there.
    pub fn jump_to(&mut self, position: usize) -> bool {
        if position < self.questions.len() {
            self.cursor = position;
            true
        } else {
            false
        }
    }

    // ─── Answers ───

    /// Record `option` for the question at `position`, replacing any earlier pick.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::QuestionOutOfRange` or `SessionError::OptionOutOfRange`
    /// if either index does not exist. The session is left unchanged.
    pub fn record_answer(&mut self, position: usize, option: usize) -> Result<(), SessionError> {
        let Some(question) = self.questions.get(position) else {
            return Err(SessionError::QuestionOutOfRange {
                position,
                len: self.questions.len(),
            });
        };
        if option >= question.option_count() {
            return Err(SessionError::OptionOutOfRange {
                position,
                option,
                len: question.option_count(),
            });
        }
        self.answers.select(position, option);
        Ok(())
    }

    /// Record `option` for the question under the cursor.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::OptionOutOfRange` if the option does not exist.
    pub fn answer_current(&mut self, option: usize) -> Result<(), SessionError> {
        self.record_answer(self.cursor, option)
    }

    #[must_use]
    pub fn is_answered(&self, position: usize) -> bool {
        self.answers.is_answered(position)
    }

    #[must_use]
    pub fn selected_option(&self, position: usize) -> Option<usize> {
        self.answers.selected(position)
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.answered_count()
    }

    #[must_use]
    pub fn unanswered_count(&self) -> usize {
        self.questions.len().saturating_sub(self.answered_count())
    }

    #[must_use]
    pub fn answered_positions(&self) -> BTreeSet<usize> {
        self.answers.answered_positions()
    }

    #[must_use]
    pub fn is_fully_answered(&self) -> bool {
        self.unanswered_count() == 0
    }

    /// Returns a summary of the current session progress.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.total_questions(),
            answered: self.answered_count(),
            unanswered: self.unanswered_count(),
            current: self.cursor,
        }
    }

    // ─── Outcome ───

    /// Grade the current answers.
    ///
    /// # Errors
    ///
    /// Propagates `ResultError` via `SessionError::Result`; unreachable for a
    /// session built through `new`/`from_questions`.
    pub fn grade(
        &self,
        quiz_id: QuizId,
        graded_at: DateTime<Utc>,
    ) -> Result<ResultSummary, SessionError> {
        Ok(grade(quiz_id, &self.questions, &self.answers, graded_at)?)
    }

    /// Per-question review of the current answers.
    #[must_use]
    pub fn review(&self) -> Vec<ReviewEntry> {
        build_report(&self.questions, &self.answers)
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("document", &self.document)
            .field("variant_tag", &self.variant_tag)
            .field("questions_len", &self.questions.len())
            .field("cursor", &self.cursor)
            .field("answered", &self.answers.answered_count())
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
