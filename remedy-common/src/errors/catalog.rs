//! Status code catalog for remedy.
//!
//! Every classified failure resolves to exactly one [`StatusCode`]. Codes are
//! grouped by the pipeline phase that raises them and each phase reserves
//! `x99` for its own "unknown" fallback.
//!
//! # Status Code Ranges
//!
//! | Range      | Phase        |
//! |------------|--------------|
//! | E000       | (any)        |
//! | E100-E199  | Init         |
//! | E200-E299  | Build        |
//! | E300-E399  | Deploy       |
//! | E400-E499  | StatusCheck  |
//! | E500-E599  | FileSync     |
//! | E600-E699  | DevInit      |
//! | E700-E799  | Cleanup      |
//!
//! # Example
//!
//! ```rust
//! use remedy_common::errors::catalog::StatusCode;
//!
//! let code = StatusCode::BuildPushAccessDenied;
//! println!("{} ({})", code.code_string(), code.message());
//! ```

use crate::phase::Phase;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome classification for a failure.
///
/// Serialized names match the wire values consumed by telemetry
/// (e.g. `BUILD_PUSH_ACCESS_DENIED`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum StatusCode {
    /// Failure raised outside any phase with a dedicated registry
    UnknownError,

    // =========================================================================
    // Init (E100-E199)
    // =========================================================================
    /// Image tagger could not be created
    InitCreateTaggerError,
    /// Artifact builder could not be created
    InitCreateBuilderError,
    /// Deployer could not be created
    InitCreateDeployerError,
    /// Test dependencies could not be resolved
    InitCreateTestDepError,
    /// Artifact cache could not be initialized
    InitCacheError,
    /// File watch trigger could not be created
    InitCreateWatchTriggerError,
    /// Unrecognized init failure
    InitUnknown,

    // =========================================================================
    // Build (E200-E299)
    // =========================================================================
    /// Image push rejected by the registry
    BuildPushAccessDenied,
    /// Local container engine is not reachable
    BuildDockerDaemonNotRunning,
    /// Build cancelled because a sibling build failed
    BuildCancelled,
    /// Unrecognized build failure
    BuildUnknown,

    // =========================================================================
    // Deploy (E300-E399)
    // =========================================================================
    /// Cluster API server is not reachable
    DeployClusterConnectionErr,
    /// Unrecognized deploy failure
    DeployUnknown,

    // =========================================================================
    // StatusCheck / FileSync (E400-E599)
    // =========================================================================
    /// Unrecognized status check failure
    StatusCheckUnknown,
    /// Unrecognized file sync failure
    SyncUnknown,

    // =========================================================================
    // DevInit (E600-E699)
    // =========================================================================
    /// Image was pushed with the deprecated v1 manifest
    DevInitUnsupportedV1Manifest,
    /// Unrecognized dev-loop init failure
    DevInitUnknown,

    // =========================================================================
    // Cleanup (E700-E799)
    // =========================================================================
    /// Unrecognized cleanup failure
    CleanupUnknown,
}

impl StatusCode {
    /// Returns the numeric status code (without prefix).
    #[must_use]
    pub const fn code_number(&self) -> u16 {
        match self {
            Self::UnknownError => 0,

            // Init (100-199)
            Self::InitCreateTaggerError => 101,
            Self::InitCreateBuilderError => 102,
            Self::InitCreateDeployerError => 103,
            Self::InitCreateTestDepError => 104,
            Self::InitCacheError => 105,
            Self::InitCreateWatchTriggerError => 106,
            Self::InitUnknown => 199,

            // Build (200-299)
            Self::BuildPushAccessDenied => 201,
            Self::BuildDockerDaemonNotRunning => 202,
            Self::BuildCancelled => 203,
            Self::BuildUnknown => 299,

            // Deploy (300-399)
            Self::DeployClusterConnectionErr => 301,
            Self::DeployUnknown => 399,

            Self::StatusCheckUnknown => 499,
            Self::SyncUnknown => 599,

            // DevInit (600-699)
            Self::DevInitUnsupportedV1Manifest => 601,
            Self::DevInitUnknown => 699,

            Self::CleanupUnknown => 799,
        }
    }

    /// Returns the formatted status code string (e.g., "RMD-E201").
    #[must_use]
    pub fn code_string(&self) -> String {
        format!("RMD-E{:03}", self.code_number())
    }

    /// Returns the phase this code belongs to, or `None` for the
    /// process-wide [`StatusCode::UnknownError`].
    #[must_use]
    pub const fn phase(&self) -> Option<Phase> {
        match self.code_number() {
            100..=199 => Some(Phase::Init),
            200..=299 => Some(Phase::Build),
            300..=399 => Some(Phase::Deploy),
            400..=499 => Some(Phase::StatusCheck),
            500..=599 => Some(Phase::FileSync),
            600..=699 => Some(Phase::DevInit),
            700..=799 => Some(Phase::Cleanup),
            _ => None,
        }
    }

    /// Whether this is a fallback code (per-phase or process-wide).
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        self.code_number() % 100 == 99 || matches!(self, Self::UnknownError)
    }

    /// Returns the per-phase fallback code.
    #[must_use]
    pub const fn unknown_for(phase: Phase) -> Self {
        match phase {
            Phase::Init => Self::InitUnknown,
            Phase::Build => Self::BuildUnknown,
            Phase::Deploy => Self::DeployUnknown,
            Phase::StatusCheck => Self::StatusCheckUnknown,
            Phase::FileSync => Self::SyncUnknown,
            Phase::DevInit => Self::DevInitUnknown,
            Phase::Cleanup => Self::CleanupUnknown,
        }
    }

    /// Returns a one-line summary of the status.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::UnknownError => "Unknown error",

            Self::InitCreateTaggerError => "Failed to create the image tagger",
            Self::InitCreateBuilderError => "Failed to create the artifact builder",
            Self::InitCreateDeployerError => "Failed to create the deployer",
            Self::InitCreateTestDepError => "Failed to resolve test dependencies",
            Self::InitCacheError => "Failed to initialize the artifact cache",
            Self::InitCreateWatchTriggerError => "Failed to create the file watch trigger",
            Self::InitUnknown => "Unknown error during init",

            Self::BuildPushAccessDenied => "No push access to the image repository",
            Self::BuildDockerDaemonNotRunning => "Cannot connect to the Docker daemon",
            Self::BuildCancelled => "Build cancelled due to another build failure",
            Self::BuildUnknown => "Unknown error during build",

            Self::DeployClusterConnectionErr => "Cannot connect to the cluster",
            Self::DeployUnknown => "Unknown error during deploy",

            Self::StatusCheckUnknown => "Unknown error during status check",
            Self::SyncUnknown => "Unknown error during file sync",

            Self::DevInitUnsupportedV1Manifest => {
                "Image uses the deprecated v1 manifest and cannot be inspected"
            }
            Self::DevInitUnknown => "Unknown error during dev loop init",

            Self::CleanupUnknown => "Unknown error during cleanup",
        }
    }

    /// Returns all status codes.
    #[must_use]
    pub const fn all() -> &'static [StatusCode] {
        &[
            Self::UnknownError,
            // Init
            Self::InitCreateTaggerError,
            Self::InitCreateBuilderError,
            Self::InitCreateDeployerError,
            Self::InitCreateTestDepError,
            Self::InitCacheError,
            Self::InitCreateWatchTriggerError,
            Self::InitUnknown,
            // Build
            Self::BuildPushAccessDenied,
            Self::BuildDockerDaemonNotRunning,
            Self::BuildCancelled,
            Self::BuildUnknown,
            // Deploy
            Self::DeployClusterConnectionErr,
            Self::DeployUnknown,
            Self::StatusCheckUnknown,
            Self::SyncUnknown,
            // DevInit
            Self::DevInitUnsupportedV1Manifest,
            Self::DevInitUnknown,
            Self::CleanupUnknown,
        ]
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code_string(), self.message())
    }
}

/// Identifies which remedy a [`crate::Suggestion`] proposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum SuggestionCode {
    /// Verify the explicit `--default-repo` override
    CheckDefaultRepo,
    /// Verify the default-repo stored in the persisted config
    CheckDefaultRepoGlobalConfig,
    /// Retry with an explicit `--default-repo`
    AddDefaultRepo,
    /// Authenticate Docker against Google Container Registry
    GcloudDockerAuthConfigure,
    /// Authenticate Docker against a generic registry
    DockerAuthConfigure,
    /// Start or verify the local container engine
    CheckDockerRunning,
    /// Verify cluster connectivity
    CheckClusterConnection,
    /// Verify the local minikube cluster is running
    CheckMinikubeStatus,
    /// Repair or bypass the artifact cache
    FixCacheError,
    /// Pull the image locally before retrying
    RunDockerPull,
    /// File a bug report
    OpenIssue,
}

impl SuggestionCode {
    /// Returns all suggestion codes.
    #[must_use]
    pub const fn all() -> &'static [SuggestionCode] {
        &[
            Self::CheckDefaultRepo,
            Self::CheckDefaultRepoGlobalConfig,
            Self::AddDefaultRepo,
            Self::GcloudDockerAuthConfigure,
            Self::DockerAuthConfigure,
            Self::CheckDockerRunning,
            Self::CheckClusterConnection,
            Self::CheckMinikubeStatus,
            Self::FixCacheError,
            Self::RunDockerPull,
            Self::OpenIssue,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_numbers_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for code in StatusCode::all() {
            let num = code.code_number();
            assert!(
                seen.insert(num),
                "Duplicate status code number: {} for {:?}",
                num,
                code
            );
        }
    }

    #[test]
    fn test_status_code_format() {
        assert_eq!(StatusCode::UnknownError.code_string(), "RMD-E000");
        assert_eq!(StatusCode::InitCacheError.code_string(), "RMD-E105");
        assert_eq!(StatusCode::BuildPushAccessDenied.code_string(), "RMD-E201");
        assert_eq!(StatusCode::CleanupUnknown.code_string(), "RMD-E799");
    }

    #[test]
    fn test_every_phase_has_unknown_code_in_range() {
        for phase in Phase::all() {
            let unknown = StatusCode::unknown_for(*phase);
            assert!(unknown.is_unknown(), "{unknown:?} should be a fallback");
            assert_eq!(unknown.phase(), Some(*phase));
        }
        assert!(StatusCode::UnknownError.is_unknown());
        assert_eq!(StatusCode::UnknownError.phase(), None);
    }

    #[test]
    fn test_specific_codes_are_not_unknown() {
        assert!(!StatusCode::BuildDockerDaemonNotRunning.is_unknown());
        assert!(!StatusCode::BuildCancelled.is_unknown());
        assert!(!StatusCode::DeployClusterConnectionErr.is_unknown());
    }

    #[test]
    fn test_all_codes_have_message() {
        for code in StatusCode::all() {
            assert!(!code.message().is_empty(), "{code:?} has empty message");
        }
    }

    #[test]
    fn test_status_code_serialization() {
        let json = serde_json::to_string(&StatusCode::BuildPushAccessDenied)
            .expect("serialization failed");
        assert_eq!(json, "\"BUILD_PUSH_ACCESS_DENIED\"");

        let parsed: StatusCode = serde_json::from_str("\"DEV_INIT_UNSUPPORTED_V1_MANIFEST\"")
            .expect("deserialization failed");
        assert_eq!(parsed, StatusCode::DevInitUnsupportedV1Manifest);
    }

    #[test]
    fn test_suggestion_code_serialization() {
        let json = serde_json::to_string(&SuggestionCode::GcloudDockerAuthConfigure)
            .expect("serialization failed");
        assert_eq!(json, "\"GCLOUD_DOCKER_AUTH_CONFIGURE\"");
    }

    #[test]
    fn test_display() {
        let display = StatusCode::BuildCancelled.to_string();
        assert!(display.contains("RMD-E203"));
        assert!(display.contains("cancelled"));
    }

    /// Codes are reported to telemetry; renumbering breaks dashboards.
    #[test]
    fn test_build_codes_stable() {
        assert_eq!(StatusCode::BuildPushAccessDenied.code_number(), 201);
        assert_eq!(StatusCode::BuildDockerDaemonNotRunning.code_number(), 202);
        assert_eq!(StatusCode::BuildCancelled.code_number(), 203);
        assert_eq!(StatusCode::BuildUnknown.code_number(), 299);
    }
}
