mod answers;
mod catalog;
mod grading;
mod ids;
mod progress;
mod question;
mod review;
mod settings;
mod variant;

pub use answers::AnswerSheet;
pub use ids::{DocumentRef, ParseIdError, QuestionId, QuizId, QuizIdGenerator};
pub use question::{Question, QuestionDraft, QuestionError, option_label};

pub use grading::{Grade, ResultError, ResultSummary, Score, grade};
pub use progress::StudentProgress;
pub use review::{OptionMark, ReviewEntry, Verdict, build_report};
pub use settings::{QuizSettings, QuizSettingsDraft, SettingsError};
pub use variant::{BankError, QuestionBank, VariantSet};
