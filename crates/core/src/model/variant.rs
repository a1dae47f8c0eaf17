use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

use crate::model::catalog;
use crate::model::question::{Question, QuestionDraft, QuestionError};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankError {
    #[error("variant {tag:?} has no questions")]
    EmptyVariant { tag: Option<String> },

    #[error("variant tag must not be blank")]
    BlankTag,

    #[error("duplicate variant tag: {0}")]
    DuplicateTag(String),

    #[error(transparent)]
    Question(#[from] QuestionError),

    #[error("invalid question bank document: {0}")]
    Parse(#[from] toml::de::Error),
}

//
// ─── VARIANT SET ───────────────────────────────────────────────────────────────
//

/// Ordered, non-empty question sequence for one examination board (or the default).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSet {
    tag: Option<String>,
    questions: Vec<Question>,
}

impl VariantSet {
    /// Build a variant set.
    ///
    /// # Errors
    ///
    /// Returns `BankError::EmptyVariant` if `questions` is empty and
    /// `BankError::BlankTag` if a tag is given but blank.
    pub fn new(tag: Option<String>, questions: Vec<Question>) -> Result<Self, BankError> {
        let tag = match tag {
            Some(t) if t.trim().is_empty() => return Err(BankError::BlankTag),
            Some(t) => Some(t.trim().to_owned()),
            None => None,
        };
        if questions.is_empty() {
            return Err(BankError::EmptyVariant { tag });
        }
        Ok(Self { tag, questions })
    }

    /// Board tag, or `None` for the default set.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Never true for a set built through `new`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

//
// ─── QUESTION BANK ─────────────────────────────────────────────────────────────
//

/// Immutable set of variants keyed by board tag, with a default fallback.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    default: VariantSet,
    variants: HashMap<String, VariantSet>,
}

#[derive(Debug, Deserialize)]
struct BankDraft {
    default: VariantDraft,
    #[serde(default)]
    variants: Vec<VariantDraft>,
}

#[derive(Debug, Deserialize)]
struct VariantDraft {
    #[serde(default)]
    tag: Option<String>,
    questions: Vec<QuestionDraft>,
}

impl VariantDraft {
    fn validate(self) -> Result<VariantSet, BankError> {
        let questions = self
            .questions
            .into_iter()
            .map(QuestionDraft::validate)
            .collect::<Result<Vec<_>, _>>()?;
        VariantSet::new(self.tag, questions)
    }
}

fn tag_key(tag: &str) -> String {
    tag.trim().to_ascii_uppercase()
}

impl QuestionBank {
    /// Build a bank from a default set and tagged variants.
    ///
    /// The default set's own tag is ignored for lookups.
    ///
    /// # Errors
    ///
    /// Returns `BankError::DuplicateTag` if two variants share a tag (ignoring
    /// ASCII case) and `BankError::BlankTag` if a variant has no tag.
    pub fn new(default: VariantSet, variants: Vec<VariantSet>) -> Result<Self, BankError> {
        let mut by_tag = HashMap::with_capacity(variants.len());
        for variant in variants {
            let Some(tag) = variant.tag() else {
                return Err(BankError::BlankTag);
            };
            let key = tag_key(tag);
            if by_tag.contains_key(&key) {
                return Err(BankError::DuplicateTag(tag.to_owned()));
            }
            by_tag.insert(key, variant);
        }
        Ok(Self {
            default,
            variants: by_tag,
        })
    }

    /// The bank that ships with the crate: a general economics set plus `ABMA`.
    ///
    /// # Errors
    ///
    /// Returns `BankError` if the bundled catalog fails validation.
    pub fn builtin() -> Result<Self, BankError> {
        let default = VariantSet::new(None, catalog::default_questions()?)?;
        let abma = VariantSet::new(Some("ABMA".to_owned()), catalog::abma_questions()?)?;
        Self::new(default, vec![abma])
    }

    /// Parse a bank from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Parse` for malformed TOML and other `BankError`
    /// variants when a question or variant fails validation.
    pub fn from_toml_str(input: &str) -> Result<Self, BankError> {
        let draft: BankDraft = toml::from_str(input)?;
        let mut default = draft.default;
        default.tag = None;
        let default = default.validate()?;
        let variants = draft
            .variants
            .into_iter()
            .map(VariantDraft::validate)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(default, variants)
    }

    /// Resolve a board tag to its variant.
    ///
    /// Absent, blank and unknown tags resolve to the default set; matching
    /// ignores surrounding whitespace and ASCII case.
    #[must_use]
    pub fn select(&self, tag: Option<&str>) -> &VariantSet {
        tag.map(tag_key)
            .filter(|key| !key.is_empty())
            .and_then(|key| self.variants.get(&key))
            .unwrap_or(&self.default)
    }

    /// Shorthand for `select(tag).questions()`.
    #[must_use]
    pub fn select_questions(&self, tag: Option<&str>) -> &[Question] {
        self.select(tag).questions()
    }

    #[must_use]
    pub fn default_variant(&self) -> &VariantSet {
        &self.default
    }

    /// Known board tags, sorted.
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.variants.values().filter_map(VariantSet::tag).collect();
        tags.sort_unstable();
        tags
    }
}
