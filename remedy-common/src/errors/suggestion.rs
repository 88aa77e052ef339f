//! Remediation suggestions attached to classified errors.

use super::catalog::SuggestionCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single remedy, in priority order within its list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Suggestion {
    /// Machine-readable remedy identifier
    #[serde(rename = "suggestionCode")]
    pub code: SuggestionCode,
    /// Text shown to the user
    pub action: String,
}

impl Suggestion {
    pub fn new(code: SuggestionCode, action: impl Into<String>) -> Self {
        Self {
            code,
            action: action.into(),
        }
    }
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.action)
    }
}

/// Joins suggestion actions with " or " and terminates with a period.
///
/// Returns an empty string for an empty list so callers never render a
/// dangling suggestion block.
pub fn concat_suggestions(suggestions: &[Suggestion]) -> String {
    if suggestions.is_empty() {
        return String::new();
    }
    let mut out = suggestions
        .iter()
        .map(|s| s.action.as_str())
        .collect::<Vec<_>>()
        .join(" or ");
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat_empty() {
        assert_eq!(concat_suggestions(&[]), "");
    }

    #[test]
    fn test_concat_single() {
        let s = [Suggestion::new(SuggestionCode::DockerAuthConfigure, "try `docker login`")];
        assert_eq!(concat_suggestions(&s), "try `docker login`.");
    }

    #[test]
    fn test_concat_keeps_order_and_duplicates() {
        let s = [
            Suggestion::new(SuggestionCode::CheckDefaultRepo, "Check your `--default-repo` value"),
            Suggestion::new(SuggestionCode::DockerAuthConfigure, "try `docker login`"),
            Suggestion::new(SuggestionCode::DockerAuthConfigure, "try `docker login`"),
        ];
        assert_eq!(
            concat_suggestions(&s),
            "Check your `--default-repo` value or try `docker login` or try `docker login`."
        );
    }

    #[test]
    fn test_suggestion_json_shape() {
        let s = Suggestion::new(SuggestionCode::OpenIssue, "open an issue");
        let json = serde_json::to_value(&s).expect("serialization failed");
        assert_eq!(json["suggestionCode"], "OPEN_ISSUE");
        assert_eq!(json["action"], "open an issue");
    }
}
