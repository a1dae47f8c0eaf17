use std::collections::{BTreeMap, BTreeSet};

/// Sparse map from question position to the selected option.
///
/// Absent positions are unanswered. The sheet itself does not bounds-check;
/// the session that owns it validates positions against its questions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSheet {
    selections: BTreeMap<usize, usize>,
}

impl AnswerSheet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `option` for `position`, replacing any earlier selection.
    pub fn select(&mut self, position: usize, option: usize) {
        self.selections.insert(position, option);
    }

    #[must_use]
    pub fn selected(&self, position: usize) -> Option<usize> {
        self.selections.get(&position).copied()
    }

    #[must_use]
    pub fn is_answered(&self, position: usize) -> bool {
        self.selections.contains_key(&position)
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.selections.len()
    }

    #[must_use]
    pub fn answered_positions(&self) -> BTreeSet<usize> {
        self.selections.keys().copied().collect()
    }

    /// Iterate `(position, option)` pairs in position order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.selections.iter().map(|(p, o)| (*p, *o))
    }
}

impl FromIterator<(usize, usize)> for AnswerSheet {
    fn from_iter<I: IntoIterator<Item = (usize, usize)>>(iter: I) -> Self {
        let mut sheet = Self::new();
        for (position, option) in iter {
            sheet.select(position, option);
        }
        sheet
    }
}
