//! Run context handed to suggestion generators.
//!
//! The run configuration loader publishes a [`RunContext`] once at startup
//! through a [`RunContextHolder`]; every classification afterwards reads it.

use crate::config::{EnvParser, Sourced};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

/// Snapshot of the effective run configuration that affects suggestions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunContext {
    /// Explicit `--default-repo` override, if the user passed one.
    #[serde(default)]
    pub default_repo: Option<String>,
    /// Path to the persisted global configuration file.
    #[serde(default)]
    pub global_config: Option<PathBuf>,
    /// Name of the active cluster context.
    #[serde(default)]
    pub kube_context: Option<String>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_default_repo(mut self, repo: impl Into<String>) -> Self {
        self.default_repo = Some(repo.into());
        self
    }

    #[must_use]
    pub fn with_global_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_kube_context(mut self, context: impl Into<String>) -> Self {
        self.kube_context = Some(context.into());
        self
    }

    /// Reads `REMEDY_DEFAULT_REPO`, `REMEDY_GLOBAL_CONFIG` and
    /// `REMEDY_KUBE_CONTEXT`. Empty values count as unset.
    pub fn from_env(parser: &mut EnvParser) -> Self {
        Self::resolve(parser, RunOverrides::default())
    }

    /// Environment values with command-line `overrides` layered on top.
    pub fn resolve(parser: &mut EnvParser, overrides: RunOverrides) -> Self {
        let default_repo = prefer_flag(
            overrides.default_repo,
            "--default-repo",
            parser.get_optional_string("DEFAULT_REPO"),
        );
        let kube_context = prefer_flag(
            overrides.kube_context,
            "--kube-context",
            parser.get_optional_string("KUBE_CONTEXT"),
        );
        let env_config = parser.get_optional_string("GLOBAL_CONFIG");
        let global_config = prefer_flag(
            overrides.global_config,
            "--global-config",
            env_config.map(|value| value.map(|raw| parser.expand_path(&raw))),
        );

        trace_setting("default_repo", &default_repo);
        trace_setting("kube_context", &kube_context);
        trace_setting("global_config", &global_config);

        Self {
            default_repo: default_repo.value,
            global_config: global_config.value,
            kube_context: kube_context.value,
        }
    }

    pub fn default_repo(&self) -> Option<&str> {
        self.default_repo.as_deref()
    }

    pub fn global_config(&self) -> Option<&Path> {
        self.global_config.as_deref()
    }

    pub fn kube_context(&self) -> Option<&str> {
        self.kube_context.as_deref()
    }
}

/// Run settings given as command-line flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOverrides {
    pub default_repo: Option<String>,
    pub kube_context: Option<String>,
    pub global_config: Option<PathBuf>,
}

fn prefer_flag<T>(flag: Option<T>, name: &str, env: Sourced<Option<T>>) -> Sourced<Option<T>> {
    match flag {
        Some(value) => Sourced::from_cli(Some(value), name),
        None => env,
    }
}

fn trace_setting<T>(setting: &str, value: &Sourced<Option<T>>) {
    if value.is_default() {
        debug!(setting, "run setting not configured");
    } else {
        debug!(
            setting,
            source = %value.source,
            origin = value.origin.as_deref().unwrap_or_default(),
            set = value.value.is_some(),
            "run setting resolved"
        );
    }
}

/// Write-once container for the process's [`RunContext`].
///
/// The first [`set`](Self::set) wins; later calls are ignored. Readers
/// before the first write see `None`.
#[derive(Debug, Default)]
pub struct RunContextHolder {
    inner: OnceLock<RunContext>,
}

impl RunContextHolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Holder that is already populated.
    pub fn with_context(ctx: RunContext) -> Self {
        let holder = Self::new();
        holder.set(ctx);
        holder
    }

    /// Publishes the run context. Returns `false` if one was already set.
    pub fn set(&self, ctx: RunContext) -> bool {
        match self.inner.set(ctx) {
            Ok(()) => true,
            Err(_) => {
                debug!("run context already set, ignoring later value");
                false
            }
        }
    }

    pub fn get(&self) -> Option<&RunContext> {
        self.inner.get()
    }

    pub fn is_set(&self) -> bool {
        self.inner.get().is_some()
    }
}
