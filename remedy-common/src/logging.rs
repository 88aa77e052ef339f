//! Process-wide tracing setup for the remedy binaries.
//!
//! Human-readable output goes to stderr; an optional JSON file sink is
//! written through a non-blocking appender whose guard must outlive `main`.

use crate::config::{EnvError, EnvParser};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter {filter:?}: {message}")]
    InvalidFilter { filter: String, message: String },

    #[error("cannot create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("log file path {0} has no file name")]
    NoFileName(PathBuf),

    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Where and how verbosely to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    level: String,
    stderr: bool,
    file: Option<PathBuf>,
    env_errors: Vec<EnvError>,
}

impl LogConfig {
    /// Reads `REMEDY_LOG` (level) and `REMEDY_LOG_FILE` (JSON sink).
    ///
    /// An invalid level falls back to `default_level`; the rejected value
    /// is kept and logged at warn once [`init_logging`] has installed the
    /// subscriber.
    pub fn from_env(default_level: &str) -> Self {
        let mut parser = EnvParser::new();
        let level = parser.get_log_level("LOG", default_level).value;
        let file = parser
            .get_optional_string("LOG_FILE")
            .value
            .map(|raw| parser.expand_path(&raw));
        Self {
            level,
            stderr: false,
            file,
            env_errors: parser.take_errors(),
        }
    }

    #[must_use]
    pub fn with_stderr(mut self) -> Self {
        self.stderr = true;
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    pub fn level(&self) -> &str {
        &self.level
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Environment values rejected while building this config.
    pub fn env_errors(&self) -> &[EnvError] {
        &self.env_errors
    }

    /// Filter directive scoping the level to remedy's own crates.
    fn filter_directive(&self) -> String {
        let level = &self.level;
        format!("warn,remedy={level},remedy_common={level},remedy_telemetry={level}")
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            stderr: true,
            file: None,
            env_errors: Vec::new(),
        }
    }
}

/// Keeps background log writers alive. Drop it last.
#[must_use = "dropping the guards stops file logging"]
pub struct LoggingGuards {
    _file: Option<WorkerGuard>,
}

impl std::fmt::Debug for LoggingGuards {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingGuards")
            .field("file", &self._file.is_some())
            .finish()
    }
}

/// Installs the global subscriber described by `config`.
pub fn init_logging(config: &LogConfig) -> Result<LoggingGuards, LoggingError> {
    let directive = config.filter_directive();
    let filter = EnvFilter::try_new(&directive).map_err(|err| LoggingError::InvalidFilter {
        filter: directive.clone(),
        message: err.to_string(),
    })?;

    let stderr_layer = config.stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
    });

    let (file_layer, guard) = match config.file() {
        Some(path) => {
            let (dir, name) = split_log_path(path)?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_current_span(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|err| LoggingError::Install(err.to_string()))?;

    for err in &config.env_errors {
        warn!(error = %err, "ignoring invalid logging environment value");
    }

    Ok(LoggingGuards { _file: guard })
}

/// Splits `path` into an existing directory and a file name.
fn split_log_path(path: &Path) -> Result<(PathBuf, PathBuf), LoggingError> {
    let name = path
        .file_name()
        .ok_or_else(|| LoggingError::NoFileName(path.to_path_buf()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|source| LoggingError::CreateDir {
        path: dir.clone(),
        source,
    })?;
    Ok((dir, PathBuf::from(name)))
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;
    use crate::config::env_test_lock;

    fn set_env(key: &str, value: &str) {
        // SAFETY: env access is serialized by env_test_lock
        unsafe { std::env::set_var(key, value) };
    }

    fn remove_env(key: &str) {
        // SAFETY: env access is serialized by env_test_lock
        unsafe { std::env::remove_var(key) };
    }

    #[test]
    fn test_from_env_reads_level_and_file() {
        let _guard = env_test_lock();
        set_env("REMEDY_LOG", "DEBUG");
        set_env("REMEDY_LOG_FILE", "/tmp/remedy/log.jsonl");

        let config = LogConfig::from_env("info");
        assert_eq!(config.level(), "debug");
        assert_eq!(config.file(), Some(Path::new("/tmp/remedy/log.jsonl")));
        assert!(config.env_errors().is_empty());

        remove_env("REMEDY_LOG");
        remove_env("REMEDY_LOG_FILE");
    }

    #[test]
    fn test_from_env_invalid_level_uses_default() {
        let _guard = env_test_lock();
        set_env("REMEDY_LOG", "chatty");
        remove_env("REMEDY_LOG_FILE");

        let config = LogConfig::from_env("warn");
        assert_eq!(config.level(), "warn");
        assert!(config.file().is_none());
        match config.env_errors() {
            [EnvError::InvalidLogLevel { var, value }] => {
                assert_eq!(var, "REMEDY_LOG");
                assert_eq!(value, "chatty");
            }
            other => panic!("unexpected env errors: {other:?}"),
        }

        remove_env("REMEDY_LOG");
    }

    #[test]
    fn test_builder_overrides() {
        let config = LogConfig::default().with_level("trace").with_file("out.jsonl");
        assert_eq!(config.level(), "trace");
        assert!(config.filter_directive().contains("remedy_common=trace"));
        assert_eq!(config.file(), Some(Path::new("out.jsonl")));
    }

    #[test]
    fn test_invalid_level_is_rejected_before_install() {
        let config = LogConfig::default().with_level("not a level!");
        assert!(matches!(
            init_logging(&config),
            Err(LoggingError::InvalidFilter { .. })
        ));
    }

    #[test]
    fn test_split_log_path_creates_parent() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("nested/dir/remedy.jsonl");

        let (dir, name) = split_log_path(&path).expect("split");
        assert!(dir.is_dir());
        assert_eq!(name, PathBuf::from("remedy.jsonl"));
    }

    #[test]
    fn test_split_log_path_bare_file_name() {
        let (dir, name) = split_log_path(Path::new("remedy.jsonl")).expect("split");
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, PathBuf::from("remedy.jsonl"));
    }
}
