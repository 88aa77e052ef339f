//! Terminal classification results.

use crate::errors::{StatusCode, Suggestion, concat_suggestions};
use crate::problem::ProblemError;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;

/// An error value that already carries a classification.
///
/// The engine reuses the code and suggestions of any such value instead of
/// matching its message again.
pub trait Classified {
    fn status_code(&self) -> StatusCode;
    fn suggestions(&self) -> Vec<Suggestion>;
    /// Message without the rendered suggestions.
    fn message(&self) -> &str;
}

/// Status code, message and remedies for one failure.
///
/// Created once per failure and never mutated; serializes to the shape
/// consumed by event streams (`errCode`, `message`, `suggestions`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionableError {
    #[serde(rename = "errCode")]
    status_code: StatusCode,
    message: String,
    #[serde(default)]
    suggestions: Vec<Suggestion>,
}

impl ActionableError {
    pub fn new(
        status_code: StatusCode,
        message: impl Into<String>,
        suggestions: Vec<Suggestion>,
    ) -> Self {
        Self {
            status_code,
            message: message.into(),
            suggestions,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn suggestion_list(&self) -> &[Suggestion] {
        &self.suggestions
    }

    /// Multi-line rendering for terminals.
    #[must_use]
    pub fn format_full(&self) -> String {
        let mut output = format!("[{}] {}\n", self.status_code.code_string(), self.message);
        if !self.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion.action));
            }
        }
        output
    }
}

impl fmt::Display for ActionableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suggestions = concat_suggestions(&self.suggestions);
        if suggestions.is_empty() {
            return f.write_str(&self.message);
        }
        write!(f, "{}. {}", self.message.trim_end_matches('.'), suggestions)
    }
}

impl StdError for ActionableError {}

impl Classified for ActionableError {
    fn status_code(&self) -> StatusCode {
        self.status_code
    }

    fn suggestions(&self) -> Vec<Suggestion> {
        self.suggestions.clone()
    }

    fn message(&self) -> &str {
        &self.message
    }
}

/// Capability lookup for a single error value.
pub fn as_classified<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a dyn Classified> {
    if let Some(actionable) = err.downcast_ref::<ActionableError>() {
        return Some(actionable);
    }
    if let Some(problem) = err.downcast_ref::<ProblemError>() {
        return Some(problem);
    }
    None
}

/// First classified value in `err`'s source chain, outermost first.
pub fn find_classified<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a dyn Classified> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(classified) = as_classified(e) {
            return Some(classified);
        }
        current = e.source();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SuggestionCode;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("deploying: {source}")]
    struct Wrapped {
        #[source]
        source: ActionableError,
    }

    #[derive(Debug, Error)]
    #[error("plain failure")]
    struct Plain;

    fn sample() -> ActionableError {
        ActionableError::new(
            StatusCode::BuildPushAccessDenied,
            "could not push image: denied",
            vec![
                Suggestion::new(
                    SuggestionCode::CheckDefaultRepo,
                    "Check your `--default-repo` value",
                ),
                Suggestion::new(SuggestionCode::DockerAuthConfigure, "try `docker login`"),
            ],
        )
    }

    #[test]
    fn test_display_with_suggestions() {
        assert_eq!(
            sample().to_string(),
            "could not push image: denied. Check your `--default-repo` value or try `docker login`."
        );
    }

    #[test]
    fn test_display_without_suggestions_has_no_block() {
        let err = ActionableError::new(StatusCode::BuildUnknown, "boom", Vec::new());
        assert_eq!(err.to_string(), "boom");
        assert!(!err.format_full().contains("Suggestions"));
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(sample()).expect("serialization failed");
        assert_eq!(json["errCode"], "BUILD_PUSH_ACCESS_DENIED");
        assert_eq!(json["message"], "could not push image: denied");
        assert_eq!(json["suggestions"][1]["suggestionCode"], "DOCKER_AUTH_CONFIGURE");

        let parsed: ActionableError = serde_json::from_value(json).expect("deserialization failed");
        assert_eq!(parsed, sample());
    }

    #[test]
    fn test_find_classified_walks_source_chain() {
        let wrapped = Wrapped { source: sample() };
        let found = find_classified(&wrapped).expect("should find inner classification");
        assert_eq!(found.status_code(), StatusCode::BuildPushAccessDenied);
        assert_eq!(found.suggestions().len(), 2);
    }

    #[test]
    fn test_find_classified_none_for_plain_errors() {
        assert!(find_classified(&Plain).is_none());
    }

    #[test]
    fn test_format_full_numbers_suggestions() {
        let full = sample().format_full();
        assert!(full.starts_with("[RMD-E201]"));
        assert!(full.contains("  1. Check your `--default-repo` value"));
        assert!(full.contains("  2. try `docker login`"));
    }
}
