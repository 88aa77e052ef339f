//! Known failure signatures.

use crate::actionable::Classified;
use crate::errors::{StatusCode, Suggestion, concat_suggestions};
use crate::suggest::{SuggestFn, SuggestionContext};
use regex::Regex;
use std::fmt;

/// Formats the message shown for a matched failure.
pub type DescribeFn = fn(&str) -> String;

/// Compiles a built-in pattern.
///
/// Only for literal patterns checked by the registry tests; user-supplied
/// patterns go through [`Problem::from_pattern`].
pub(crate) fn re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid built-in pattern {pattern:?}: {err}"))
}

/// One recognizable failure: a message pattern, the status code it maps
/// to, and how to describe and remedy it.
#[derive(Clone)]
pub struct Problem {
    regexp: Regex,
    status_code: StatusCode,
    description: Option<DescribeFn>,
    suggestion: SuggestFn,
    catch_all: bool,
}

impl Problem {
    pub fn new(regexp: Regex, status_code: StatusCode, suggestion: SuggestFn) -> Self {
        Self {
            regexp,
            status_code,
            description: None,
            suggestion,
            catch_all: false,
        }
    }

    /// Compiles `pattern` and builds a problem from it.
    pub fn from_pattern(
        pattern: &str,
        status_code: StatusCode,
        suggestion: SuggestFn,
    ) -> Result<Self, regex::Error> {
        Ok(Self::new(Regex::new(pattern)?, status_code, suggestion))
    }

    /// Terminal entry matching every message.
    pub fn catch_all(status_code: StatusCode, suggestion: SuggestFn) -> Self {
        Self {
            catch_all: true,
            ..Self::new(re(".*"), status_code, suggestion)
        }
    }

    #[must_use]
    pub fn with_description(mut self, describe: DescribeFn) -> Self {
        self.description = Some(describe);
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    pub fn pattern(&self) -> &str {
        self.regexp.as_str()
    }

    pub fn is_catch_all(&self) -> bool {
        self.catch_all
    }

    pub fn matches(&self, message: &str) -> bool {
        self.regexp.is_match(message)
    }

    /// Message to display; the raw message unless a formatter is set.
    pub fn describe(&self, message: &str) -> String {
        match self.description {
            Some(describe) => describe(message),
            None => message.to_string(),
        }
    }

    pub fn suggest(&self, ctx: &SuggestionContext<'_>) -> Vec<Suggestion> {
        (self.suggestion)(ctx)
    }

    /// Binds this problem to a concrete failure.
    pub fn with_err(&self, message: &str, ctx: &SuggestionContext<'_>) -> ProblemError {
        ProblemError {
            status_code: self.status_code,
            description: self.describe(message),
            message: message.to_string(),
            suggestions: self.suggest(ctx),
        }
    }
}

impl fmt::Debug for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Problem")
            .field("pattern", &self.regexp.as_str())
            .field("status_code", &self.status_code)
            .field("catch_all", &self.catch_all)
            .finish()
    }
}

/// A failure that has been matched to a [`Problem`].
///
/// Carries its classification with it, so passing it back through the
/// engine never re-derives or duplicates suggestions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemError {
    status_code: StatusCode,
    description: String,
    message: String,
    suggestions: Vec<Suggestion>,
}

impl ProblemError {
    /// Builds a problem error from an existing classification.
    pub fn from_parts(
        status_code: StatusCode,
        message: impl Into<String>,
        suggestions: Vec<Suggestion>,
    ) -> Self {
        let message = message.into();
        Self {
            status_code,
            description: message.clone(),
            message,
            suggestions,
        }
    }

    /// Original failure text.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for ProblemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suggestions = concat_suggestions(&self.suggestions);
        if suggestions.is_empty() {
            return f.write_str(&self.description);
        }
        write!(
            f,
            "{}. {}",
            self.description.trim_end_matches('.'),
            suggestions
        )
    }
}

impl std::error::Error for ProblemError {}

impl Classified for ProblemError {
    fn status_code(&self) -> StatusCode {
        self.status_code
    }

    fn suggestions(&self) -> Vec<Suggestion> {
        self.suggestions.clone()
    }

    /// The rendered description, which is what `Display` shows.
    fn message(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SuggestionCode;
    use crate::global_config::FileConfigStore;
    use crate::suggest::{no_suggestions, suggest_docker_running};

    fn ctx_store() -> FileConfigStore {
        FileConfigStore::default()
    }

    #[test]
    fn test_describe_defaults_to_message() {
        let p = Problem::new(re("boom"), StatusCode::BuildUnknown, no_suggestions);
        assert_eq!(p.describe("boom happened"), "boom happened");
    }

    #[test]
    fn test_describe_uses_formatter() {
        let p = Problem::new(re("boom"), StatusCode::BuildUnknown, no_suggestions)
            .with_description(|msg| format!("Build Failed: {msg}"));
        assert_eq!(p.describe("boom"), "Build Failed: boom");
    }

    #[test]
    fn test_catch_all_matches_everything() {
        let p = Problem::catch_all(StatusCode::DeployUnknown, no_suggestions);
        assert!(p.is_catch_all());
        assert!(p.matches(""));
        assert!(p.matches("anything at all"));
    }

    #[test]
    fn test_from_pattern_rejects_invalid_regex() {
        let result = Problem::from_pattern("(unclosed", StatusCode::BuildUnknown, no_suggestions);
        assert!(result.is_err());
    }

    #[test]
    fn test_problem_error_display_joins_suggestions() {
        let store = ctx_store();
        let ctx = SuggestionContext::new(None, &store);
        let p = Problem::new(
            re("daemon"),
            StatusCode::BuildDockerDaemonNotRunning,
            suggest_docker_running,
        )
        .with_description(|_| "Build Failed. Docker is down.".to_string());

        let err = p.with_err("daemon gone", &ctx);
        assert_eq!(
            err.to_string(),
            "Build Failed. Docker is down. Check if docker is running."
        );
        assert_eq!(err.status_code(), StatusCode::BuildDockerDaemonNotRunning);
        assert_eq!(err.suggestions()[0].code, SuggestionCode::CheckDockerRunning);
        assert_eq!(err.message(), "daemon gone");
    }

    #[test]
    fn test_problem_error_display_without_suggestions() {
        let err =
            ProblemError::from_parts(StatusCode::BuildCancelled, "Build Cancelled", Vec::new());
        assert_eq!(err.to_string(), "Build Cancelled");
    }
}
