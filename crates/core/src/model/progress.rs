use crate::model::grading::ResultSummary;

/// Student progress as reported by the system of record.
///
/// Read-only to this crate: best result, average and attempt count are
/// computed externally and carried through unchanged.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StudentProgress {
    best_result: Option<ResultSummary>,
    average_percentage: f64,
    history: Vec<ResultSummary>,
    attempt_count: u32,
}

impl StudentProgress {
    #[must_use]
    pub fn from_persisted(
        best_result: Option<ResultSummary>,
        average_percentage: f64,
        history: Vec<ResultSummary>,
        attempt_count: u32,
    ) -> Self {
        Self {
            best_result,
            average_percentage,
            history,
            attempt_count,
        }
    }

    /// Progress for a student with no attempts yet.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn best_result(&self) -> Option<&ResultSummary> {
        self.best_result.as_ref()
    }

    /// Best percentage, or 0 when there is no best result yet.
    #[must_use]
    pub fn best_percentage(&self) -> f64 {
        self.best_result
            .as_ref()
            .map_or(0.0, ResultSummary::percentage)
    }

    #[must_use]
    pub fn average_percentage(&self) -> f64 {
        self.average_percentage
    }

    /// History in the order the system of record returned it.
    #[must_use]
    pub fn history(&self) -> &[ResultSummary] {
        &self.history
    }

    /// History sorted by timestamp, most recent first.
    #[must_use]
    pub fn history_newest_first(&self) -> Vec<&ResultSummary> {
        let mut sorted: Vec<&ResultSummary> = self.history.iter().collect();
        sorted.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
        sorted
    }

    #[must_use]
    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    #[must_use]
    pub fn has_attempts(&self) -> bool {
        self.attempt_count > 0
    }
}
