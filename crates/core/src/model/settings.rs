use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

const DEFAULT_SUBMIT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_QUIZ_ID_PREFIX: &str = "quiz";

/// Validated runtime settings for quiz sessions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizSettings {
    submit_timeout: Duration,
    quiz_id_prefix: String,
}

/// Raw settings, typically read from a TOML file.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuizSettingsDraft {
    pub submit_timeout_secs: Option<u64>,
    pub quiz_id_prefix: Option<String>,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("submit timeout must be greater than zero")]
    ZeroTimeout,
    #[error("quiz id prefix must be non-empty and contain no whitespace")]
    InvalidPrefix,
    #[error("invalid settings document: {0}")]
    Parse(#[from] toml::de::Error),
}

impl QuizSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and normalize the draft, filling defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` for a zero timeout or a blank prefix.
    pub fn validate(self) -> Result<QuizSettings, SettingsError> {
        let secs = self
            .submit_timeout_secs
            .unwrap_or(DEFAULT_SUBMIT_TIMEOUT_SECS);
        if secs == 0 {
            return Err(SettingsError::ZeroTimeout);
        }

        let quiz_id_prefix = match self.quiz_id_prefix {
            None => DEFAULT_QUIZ_ID_PREFIX.to_owned(),
            Some(prefix) => {
                let prefix = prefix.trim().to_owned();
                if prefix.is_empty() || prefix.chars().any(char::is_whitespace) {
                    return Err(SettingsError::InvalidPrefix);
                }
                prefix
            }
        };

        Ok(QuizSettings {
            submit_timeout: Duration::from_secs(secs),
            quiz_id_prefix,
        })
    }
}

impl QuizSettings {
    /// Parse and validate settings from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Parse` for malformed input, or a validation error.
    pub fn from_toml_str(input: &str) -> Result<Self, SettingsError> {
        let draft: QuizSettingsDraft = toml::from_str(input)?;
        draft.validate()
    }

    #[must_use]
    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.submit_timeout = timeout;
        }
        self
    }

    #[must_use]
    pub fn submit_timeout(&self) -> Duration {
        self.submit_timeout
    }

    #[must_use]
    pub fn quiz_id_prefix(&self) -> &str {
        &self.quiz_id_prefix
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            submit_timeout: Duration::from_secs(DEFAULT_SUBMIT_TIMEOUT_SECS),
            quiz_id_prefix: DEFAULT_QUIZ_ID_PREFIX.to_owned(),
        }
    }
}
