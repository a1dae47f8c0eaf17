use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {id} has an empty prompt")]
    EmptyPrompt { id: QuestionId },

    #[error("question {id} needs at least two options, got {len}")]
    TooFewOptions { id: QuestionId, len: usize },

    #[error("question {id} has an empty option at position {position}")]
    EmptyOption { id: QuestionId, position: usize },

    #[error("question {id} marks option {correct} as correct but only has {len} options")]
    CorrectOutOfRange {
        id: QuestionId,
        correct: usize,
        len: usize,
    },
}

/// A single multiple-choice question.
///
/// Immutable once built; `correct_option` always indexes into `options`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<String>,
    correct_option: usize,
}

/// Unvalidated question, as written in a bank file.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionDraft {
    pub id: String,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_option: usize,
}

impl Question {
    /// Build a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt or an option is blank, if fewer than
    /// two options are given, or if `correct_option` is out of range.
    pub fn new(
        id: impl Into<String>,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_option: usize,
    ) -> Result<Self, QuestionError> {
        let id = QuestionId::new(id);
        let prompt = prompt.into().trim().to_owned();
        if prompt.is_empty() {
            return Err(QuestionError::EmptyPrompt { id });
        }
        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions {
                id,
                len: options.len(),
            });
        }
        if let Some(position) = options.iter().position(|o| o.trim().is_empty()) {
            return Err(QuestionError::EmptyOption { id, position });
        }
        if correct_option >= options.len() {
            return Err(QuestionError::CorrectOutOfRange {
                id,
                correct: correct_option,
                len: options.len(),
            });
        }

        Ok(Self {
            id,
            prompt,
            options,
            correct_option,
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn correct_option(&self) -> usize {
        self.correct_option
    }

    /// Returns true if `option` is the correct choice.
    #[must_use]
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct_option
    }
}

impl QuestionDraft {
    /// Validate the draft into a [`Question`].
    ///
    /// # Errors
    ///
    /// See [`Question::new`].
    pub fn validate(self) -> Result<Question, QuestionError> {
        Question::new(self.id, self.prompt, self.options, self.correct_option)
    }
}

/// Letter used to present the option at `position` (`A`, `B`, ...).
///
/// Positions past `Z` fall back to the 1-based number.
#[must_use]
pub fn option_label(position: usize) -> String {
    u8::try_from(position)
        .ok()
        .filter(|p| *p < 26)
        .map_or_else(|| (position + 1).to_string(), |p| char::from(b'A' + p).to_string())
}
