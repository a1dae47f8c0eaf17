use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::answers::AnswerSheet;
use crate::model::ids::QuizId;
use crate::model::question::Question;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ResultError {
    #[error("a result needs at least one question")]
    NoQuestions,

    #[error("correct answers ({correct}) exceed total questions ({total})")]
    CountMismatch { correct: u32, total: u32 },

    #[error("percentage out of range: {0}")]
    PercentageOutOfRange(f64),

    #[error("invalid grade letter: {0}")]
    InvalidGrade(String),
}

//
// ─── GRADE ─────────────────────────────────────────────────────────────────────
//

/// Five fixed letter tiers.
///
/// Thresholds are inclusive lower bounds checked from the top:
/// 90 → A, 80 → B, 70 → C, 60 → D, anything else F.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    const TIERS: [(f64, Grade); 4] = [
        (90.0, Grade::A),
        (80.0, Grade::B),
        (70.0, Grade::C),
        (60.0, Grade::D),
    ];

    /// Look up the tier for a percentage in `[0, 100]`.
    #[must_use]
    pub fn from_percentage(percentage: f64) -> Self {
        Self::TIERS
            .iter()
            .find(|(floor, _)| percentage >= *floor)
            .map_or(Grade::F, |(_, grade)| *grade)
    }

    #[must_use]
    pub fn letter(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }

    /// Fixed feedback line shown with the grade.
    #[must_use]
    pub fn feedback(self) -> &'static str {
        match self {
            Grade::A => "Excellent work!",
            Grade::B => "Great job!",
            Grade::C => "Good effort. Keep practicing!",
            Grade::D => "Study a little more and try again.",
            Grade::F => "Don't give up. Review the material and retake the quiz.",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

impl FromStr for Grade {
    type Err = ResultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" => Ok(Grade::A),
            "B" => Ok(Grade::B),
            "C" => Ok(Grade::C),
            "D" => Ok(Grade::D),
            "F" => Ok(Grade::F),
            other => Err(ResultError::InvalidGrade(other.to_owned())),
        }
    }
}

//
// ─── SCORE ─────────────────────────────────────────────────────────────────────
//

/// Raw tally of correct answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub correct: u32,
    pub total: u32,
}

impl Score {
    /// Count positions whose recorded answer equals the correct option.
    ///
    /// Unanswered positions count as incorrect.
    #[must_use]
    pub fn tally(questions: &[Question], answers: &AnswerSheet) -> Self {
        let correct = questions
            .iter()
            .enumerate()
            .filter(|(position, question)| {
                answers
                    .selected(*position)
                    .is_some_and(|option| question.is_correct(option))
            })
            .count();

        Self {
            correct: u32::try_from(correct).unwrap_or(u32::MAX),
            total: u32::try_from(questions.len()).unwrap_or(u32::MAX),
        }
    }

    #[must_use]
    pub fn incorrect(&self) -> u32 {
        self.total.saturating_sub(self.correct)
    }

    /// `100 * correct / total`, or 0 for an empty tally.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.correct) * 100.0 / f64::from(self.total)
    }

    #[must_use]
    pub fn grade(&self) -> Grade {
        Grade::from_percentage(self.percentage())
    }
}

//
// ─── RESULT SUMMARY ────────────────────────────────────────────────────────────
//

/// Graded outcome of one submitted attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSummary {
    quiz_id: QuizId,
    correct_answers: u32,
    total_questions: u32,
    percentage: f64,
    grade: Grade,
    feedback: String,
    timestamp: DateTime<Utc>,
}

impl ResultSummary {
    /// Build a summary from a tally, deriving percentage, grade and feedback.
    ///
    /// # Errors
    ///
    /// Returns `ResultError::NoQuestions` for an empty tally and
    /// `ResultError::CountMismatch` if `correct > total`.
    pub fn from_score(
        quiz_id: QuizId,
        score: Score,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, ResultError> {
        if score.total == 0 {
            return Err(ResultError::NoQuestions);
        }
        if score.correct > score.total {
            return Err(ResultError::CountMismatch {
                correct: score.correct,
                total: score.total,
            });
        }
        let grade = score.grade();
        Ok(Self {
            quiz_id,
            correct_answers: score.correct,
            total_questions: score.total,
            percentage: score.percentage(),
            grade,
            feedback: grade.feedback().to_owned(),
            timestamp,
        })
    }

    /// Rehydrate a summary read back from the system of record.
    ///
    /// Percentage, grade and feedback are taken as given.
    ///
    /// # Errors
    ///
    /// Returns `ResultError` if counts are inconsistent or the percentage is
    /// outside `[0, 100]`.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        quiz_id: QuizId,
        correct_answers: u32,
        total_questions: u32,
        percentage: f64,
        grade: Grade,
        feedback: String,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, ResultError> {
        if total_questions == 0 {
            return Err(ResultError::NoQuestions);
        }
        if correct_answers > total_questions {
            return Err(ResultError::CountMismatch {
                correct: correct_answers,
                total: total_questions,
            });
        }
        if !(0.0..=100.0).contains(&percentage) {
            return Err(ResultError::PercentageOutOfRange(percentage));
        }
        Ok(Self {
            quiz_id,
            correct_answers,
            total_questions,
            percentage,
            grade,
            feedback,
            timestamp,
        })
    }

    #[must_use]
    pub fn quiz_id(&self) -> &QuizId {
        &self.quiz_id
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn incorrect_answers(&self) -> u32 {
        self.total_questions.saturating_sub(self.correct_answers)
    }

    #[must_use]
    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    #[must_use]
    pub fn grade(&self) -> Grade {
        self.grade
    }

    #[must_use]
    pub fn feedback(&self) -> &str {
        &self.feedback
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Grade an attempt.
///
/// Pure: the quiz identifier and timestamp come from the caller.
///
/// # Errors
///
/// Returns `ResultError::NoQuestions` if `questions` is empty.
pub fn grade(
    quiz_id: QuizId,
    questions: &[Question],
    answers: &AnswerSheet,
    graded_at: DateTime<Utc>,
) -> Result<ResultSummary, ResultError> {
    ResultSummary::from_score(quiz_id, Score::tally(questions, answers), graded_at)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
