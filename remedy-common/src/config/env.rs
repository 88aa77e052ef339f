//! Environment variable parsing with type safety.
//!
//! Provides a type-safe parser for `REMEDY_` environment variables with
//! validation, error collection, and source tracking.

use super::source::Sourced;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during environment variable parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    /// Invalid log level.
    #[error("Invalid log level for {var}: {value}")]
    InvalidLogLevel { var: String, value: String },
}

/// Type-safe environment variable parser.
///
/// Collects errors during parsing so all issues can be reported at once.
pub struct EnvParser {
    prefix: &'static str,
    errors: Vec<EnvError>,
}

impl EnvParser {
    /// Create a new parser with the REMEDY_ prefix.
    pub fn new() -> Self {
        Self {
            prefix: "REMEDY_",
            errors: Vec::new(),
        }
    }

    /// Take ownership of errors.
    pub fn take_errors(&mut self) -> Vec<EnvError> {
        std::mem::take(&mut self.errors)
    }

    fn var_name(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    /// Expand a leading `~/` to the home directory.
    pub fn expand_path(&self, value: &str) -> PathBuf {
        if let Some(stripped) = value.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return home.join(stripped);
        }
        PathBuf::from(value)
    }

    /// Get a log level value with validation.
    pub fn get_log_level(&mut self, name: &str, default: &str) -> Sourced<String> {
        let var_name = self.var_name(name);
        match env::var(&var_name) {
            Ok(value) => {
                let lower = value.to_lowercase();
                match lower.as_str() {
                    "trace" | "debug" | "info" | "warn" | "error" | "off" => {
                        Sourced::from_env(lower, var_name)
                    }
                    _ => {
                        self.errors.push(EnvError::InvalidLogLevel {
                            var: var_name.clone(),
                            value: value.clone(),
                        });
                        Sourced::from_env(default.to_string(), var_name)
                    }
                }
            }
            Err(_) => Sourced::default_value(default.to_string()),
        }
    }

    /// Get an optional string (None if not set or empty).
    pub fn get_optional_string(&mut self, name: &str) -> Sourced<Option<String>> {
        let var_name = self.var_name(name);
        match env::var(&var_name) {
            Ok(value) if value.is_empty() => Sourced::from_env(None, var_name),
            Ok(value) => Sourced::from_env(Some(value), var_name),
            Err(_) => Sourced::default_value(None),
        }
    }
}

impl Default for EnvParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;
    use crate::config::{ConfigSource, env_test_lock};
    use crate::context::{RunContext, RunOverrides};
    use std::env;

    fn cleanup_env(vars: &[&str]) {
        for var in vars {
            // SAFETY: env access is serialized by env_test_lock
            unsafe { env::remove_var(var) };
        }
    }

    fn set_env(key: &str, value: &str) {
        // SAFETY: env access is serialized by env_test_lock
        unsafe { env::set_var(key, value) };
    }

    #[test]
    fn test_get_log_level_invalid() {
        let _guard = env_test_lock();
        let vars = ["REMEDY_TEST_LOG_LEVEL_BAD"];
        cleanup_env(&vars);

        set_env("REMEDY_TEST_LOG_LEVEL_BAD", "loud");
        let mut parser = EnvParser::new();
        let result = parser.get_log_level("TEST_LOG_LEVEL_BAD", "info");
        assert_eq!(result.value, "info");
        assert!(matches!(
            parser.take_errors().as_slice(),
            [EnvError::InvalidLogLevel { .. }]
        ));
        assert!(parser.take_errors().is_empty());

        cleanup_env(&vars);
    }

    #[test]
    fn test_optional_string_empty_is_none() {
        let _guard = env_test_lock();
        let vars = ["REMEDY_TEST_OPT_EMPTY"];
        cleanup_env(&vars);

        set_env("REMEDY_TEST_OPT_EMPTY", "");
        let mut parser = EnvParser::new();
        let result = parser.get_optional_string("TEST_OPT_EMPTY");
        assert_eq!(result.value, None);
        assert_eq!(result.source, ConfigSource::Environment);

        cleanup_env(&vars);
    }

    #[test]
    fn test_run_context_from_env() {
        let _guard = env_test_lock();
        let vars = [
            "REMEDY_DEFAULT_REPO",
            "REMEDY_GLOBAL_CONFIG",
            "REMEDY_KUBE_CONTEXT",
        ];
        cleanup_env(&vars);

        set_env("REMEDY_DEFAULT_REPO", "gcr.io/team");
        set_env("REMEDY_KUBE_CONTEXT", "minikube");
        let mut parser = EnvParser::new();
        let ctx = RunContext::from_env(&mut parser);
        assert_eq!(ctx.default_repo(), Some("gcr.io/team"));
        assert_eq!(ctx.kube_context(), Some("minikube"));
        assert_eq!(ctx.global_config(), None);

        cleanup_env(&vars);
    }

    #[test]
    fn test_run_context_flags_override_env() {
        let _guard = env_test_lock();
        let vars = [
            "REMEDY_DEFAULT_REPO",
            "REMEDY_GLOBAL_CONFIG",
            "REMEDY_KUBE_CONTEXT",
        ];
        cleanup_env(&vars);

        set_env("REMEDY_DEFAULT_REPO", "gcr.io/from-env");
        set_env("REMEDY_KUBE_CONTEXT", "minikube");
        set_env("REMEDY_GLOBAL_CONFIG", "/etc/remedy/config.toml");
        let overrides = RunOverrides {
            default_repo: Some("quay.io/from-flag".to_string()),
            global_config: Some(PathBuf::from("/tmp/flag.toml")),
            ..Default::default()
        };
        let mut parser = EnvParser::new();
        let ctx = RunContext::resolve(&mut parser, overrides);
        assert_eq!(ctx.default_repo(), Some("quay.io/from-flag"));
        assert_eq!(ctx.kube_context(), Some("minikube"));
        assert_eq!(ctx.global_config(), Some(std::path::Path::new("/tmp/flag.toml")));

        cleanup_env(&vars);
    }

    #[test]
    fn test_run_context_expands_home_in_global_config() {
        let _guard = env_test_lock();
        let vars = ["REMEDY_GLOBAL_CONFIG"];
        cleanup_env(&vars);

        set_env("REMEDY_GLOBAL_CONFIG", "~/remedy/config.toml");
        let mut parser = EnvParser::new();
        let ctx = RunContext::from_env(&mut parser);
        let expected = parser.expand_path("~/remedy/config.toml");
        assert_eq!(ctx.global_config(), Some(expected.as_path()));

        cleanup_env(&vars);
    }
}
