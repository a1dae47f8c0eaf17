use crate::model::answers::AnswerSheet;
use crate::model::question::Question;

/// Per-question classification in the review report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
}

/// How a renderer should mark one option of a reviewed question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMark {
    /// Neither the right answer nor the user's pick.
    Unmarked,
    /// The right answer, not picked by the user.
    CorrectAnswer,
    /// The right answer, picked by the user.
    CorrectPick,
    /// Picked by the user but wrong.
    WrongPick,
}

/// Review line for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewEntry {
    pub position: usize,
    pub verdict: Verdict,
    pub selected: Option<usize>,
    pub correct: usize,
}

impl ReviewEntry {
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.verdict == Verdict::Correct
    }

    #[must_use]
    pub fn is_unanswered(&self) -> bool {
        self.selected.is_none()
    }

    /// Mark for the option at `option`.
    #[must_use]
    pub fn option_mark(&self, option: usize) -> OptionMark {
        let picked = self.selected == Some(option);
        match (option == self.correct, picked) {
            (true, true) => OptionMark::CorrectPick,
            (true, false) => OptionMark::CorrectAnswer,
            (false, true) => OptionMark::WrongPick,
            (false, false) => OptionMark::Unmarked,
        }
    }
}

/// Build the per-question review for an attempt, in question order.
#[must_use]
pub fn build_report(questions: &[Question], answers: &AnswerSheet) -> Vec<ReviewEntry> {
    questions
        .iter()
        .enumerate()
        .map(|(position, question)| {
            let selected = answers.selected(position);
            let verdict = match selected {
                Some(option) if question.is_correct(option) => Verdict::Correct,
                _ => Verdict::Incorrect,
            };
            ReviewEntry {
                position,
                verdict,
                selected,
                correct: question.correct_option(),
            }
        })
        .collect()
}
