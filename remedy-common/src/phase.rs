//! Pipeline phases a failure can be raised in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Stage of the build/deploy pipeline that produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Runner construction (taggers, builders, deployers, caches).
    Init,
    /// Artifact builds and pushes.
    Build,
    /// Manifest rendering and apply.
    Deploy,
    /// Waiting for deployed resources to stabilize.
    StatusCheck,
    /// Copying changed files into running containers.
    FileSync,
    /// Dev loop setup (dependency registration, watchers).
    DevInit,
    /// Tear-down of deployed resources.
    Cleanup,
}

impl Phase {
    /// All phases in pipeline order.
    #[must_use]
    pub const fn all() -> &'static [Phase] {
        &[
            Self::Init,
            Self::Build,
            Self::Deploy,
            Self::StatusCheck,
            Self::FileSync,
            Self::DevInit,
            Self::Cleanup,
        ]
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "Init",
            Self::Build => "Build",
            Self::Deploy => "Deploy",
            Self::StatusCheck => "StatusCheck",
            Self::FileSync => "FileSync",
            Self::DevInit => "DevInit",
            Self::Cleanup => "Cleanup",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a phase name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "unknown phase '{0}' (expected one of: init, build, deploy, status-check, file-sync, \
     dev-init, cleanup)"
)]
pub struct ParsePhaseError(pub String);

impl FromStr for Phase {
    type Err = ParsePhaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "init" => Ok(Self::Init),
            "build" => Ok(Self::Build),
            "deploy" => Ok(Self::Deploy),
            "statuscheck" => Ok(Self::StatusCheck),
            "filesync" | "sync" => Ok(Self::FileSync),
            "devinit" => Ok(Self::DevInit),
            "cleanup" => Ok(Self::Cleanup),
            _ => Err(ParsePhaseError(s.to_string())),
        }
    }
}
