/// Aggregated view of quiz progress, useful for navigation UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub unanswered: usize,
    pub current: usize,
}

impl SessionProgress {
    #[must_use]
    pub fn is_fully_answered(&self) -> bool {
        self.unanswered == 0
    }
}
