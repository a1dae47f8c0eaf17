use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::time::Clock;

/// Reference to the study document a quiz was started from.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentRef(String);

impl DocumentRef {
    /// Creates a new `DocumentRef`.
    ///
    /// # Errors
    ///
    /// Returns `ParseIdError` if the reference is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, ParseIdError> {
        let value = value.into().trim().to_owned();
        if value.is_empty() {
            return Err(ParseIdError {
                kind: "DocumentRef".to_string(),
            });
        }
        Ok(Self(value))
    }

    /// Returns the underlying reference.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier of a question inside a question bank.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier of one submission attempt.
///
/// Unique for the lifetime of the process; see [`QuizIdGenerator`].
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuizId(String);

impl QuizId {
    /// Wraps an identifier received from the system of record.
    #[must_use]
    pub fn from_persisted(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentRef({})", self.0)
    }
}

impl fmt::Debug for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionId({})", self.0)
    }
}

impl fmt::Debug for QuizId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuizId({})", self.0)
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for QuizId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error returned when an identifier cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for DocumentRef {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentRef::new(s)
    }
}

// ─── Quiz id generation ────────────────────────────────────────────────────────

/// Issues quiz identifiers of the form `{prefix}-{document}-{micros}`.
///
/// The timestamp part is a high-water mark: every issued value is strictly
/// greater than the previous one, even when the clock does not move between
/// calls (same millisecond, or a fixed test clock). Uniqueness holds per
/// generator, so the only instance handed out is [`QuizIdGenerator::global`].
#[derive(Debug)]
pub struct QuizIdGenerator {
    last_micros: AtomicU64,
}

impl QuizIdGenerator {
    const fn new() -> Self {
        Self {
            last_micros: AtomicU64::new(0),
        }
    }

    /// Process-wide generator shared by every quiz loop.
    #[must_use]
    pub fn global() -> &'static Self {
        static GLOBAL: QuizIdGenerator = QuizIdGenerator::new();
        &GLOBAL
    }

    /// Returns the next monotonic stamp, at least the clock's current microseconds.
    pub fn next_stamp(&self, clock: &Clock) -> u64 {
        let now = clock.now_micros();
        let bump = |last: u64| now.max(last.saturating_add(1));
        let previous = self
            .last_micros
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| Some(bump(last)))
            .unwrap_or_else(|last| last);
        bump(previous)
    }

    /// Generate a fresh identifier for an attempt on `document`.
    pub fn generate(&self, prefix: &str, document: &DocumentRef, clock: &Clock) -> QuizId {
        let stamp = self.next_stamp(clock);
        QuizId(format!("{prefix}-{document}-{stamp}"))
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
