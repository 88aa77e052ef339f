//! Persisted per-cluster-context configuration.
//!
//! Users can store settings such as a default image repository in a TOML
//! file, either globally or per cluster context:
//!
//! ```toml
//! [global]
//! default-repo = "gcr.io/team"
//!
//! [[kube-contexts]]
//! kube-context = "minikube"
//! default-repo = "localhost:5000"
//! ```
//!
//! Entries for the active context override the `[global]` section.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::trace;

/// Errors reading the persisted configuration.
#[derive(Debug, Error)]
pub enum GlobalConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Effective settings for one cluster context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContextConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kube_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_repo: Option<String>,
}

impl ContextConfig {
    /// Default repository, ignoring empty strings.
    pub fn default_repo(&self) -> Option<&str> {
        self.default_repo.as_deref().filter(|repo| !repo.is_empty())
    }

    /// Fields set on `overlay` replace the ones in `self`.
    fn merged_with(mut self, overlay: &ContextConfig) -> Self {
        if overlay.kube_context.is_some() {
            self.kube_context.clone_from(&overlay.kube_context);
        }
        if overlay.default_repo.is_some() {
            self.default_repo.clone_from(&overlay.default_repo);
        }
        self
    }
}

/// On-disk layout of the persisted configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GlobalConfigFile {
    #[serde(default)]
    pub global: Option<ContextConfig>,
    #[serde(default)]
    pub kube_contexts: Vec<ContextConfig>,
}

impl GlobalConfigFile {
    /// Resolves the settings for `kube_context`, falling back to `[global]`.
    pub fn for_context(&self, kube_context: Option<&str>) -> ContextConfig {
        let base = self.global.clone().unwrap_or_default();
        let Some(name) = kube_context else {
            return base;
        };
        match self
            .kube_contexts
            .iter()
            .find(|entry| entry.kube_context.as_deref() == Some(name))
        {
            Some(entry) => base.merged_with(entry),
            None => base,
        }
    }
}

/// Source of persisted configuration, keyed by cluster context.
pub trait GlobalConfigStore: Send + Sync {
    /// Loads the settings for `kube_context`.
    ///
    /// `global_config` overrides the default file location. A missing file
    /// yields an empty [`ContextConfig`], not an error.
    fn config_for_context(
        &self,
        global_config: Option<&Path>,
        kube_context: Option<&str>,
    ) -> Result<ContextConfig, GlobalConfigError>;
}

/// Reads the configuration from a TOML file.
#[derive(Debug, Clone, Default)]
pub struct FileConfigStore {
    default_path: Option<PathBuf>,
}

impl FileConfigStore {
    /// Uses `<config_dir>/remedy/config.toml` as the default location.
    pub fn new() -> Self {
        Self {
            default_path: default_config_path(),
        }
    }

    /// Uses `path` whenever the run context doesn't name a file.
    pub fn with_default_path(path: impl Into<PathBuf>) -> Self {
        Self {
            default_path: Some(path.into()),
        }
    }

    fn load(&self, path: &Path) -> Result<GlobalConfigFile, GlobalConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                trace!(path = %path.display(), "no persisted config file");
                return Ok(GlobalConfigFile::default());
            }
            Err(source) => {
                return Err(GlobalConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml::from_str(&contents).map_err(|source| GlobalConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl GlobalConfigStore for FileConfigStore {
    fn config_for_context(
        &self,
        global_config: Option<&Path>,
        kube_context: Option<&str>,
    ) -> Result<ContextConfig, GlobalConfigError> {
        let path = match global_config {
            Some(path) => path.to_path_buf(),
            None => match &self.default_path {
                Some(path) => path.clone(),
                None => return Ok(ContextConfig::default()),
            },
        };
        Ok(self.load(&path)?.for_context(kube_context))
    }
}

/// Default location of the persisted configuration file.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("remedy").join("config.toml"))
}
