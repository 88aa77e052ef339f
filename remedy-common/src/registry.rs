//! Per-phase registry of known problems.
//!
//! Each phase owns an ordered list of [`Problem`]s ending in a catch-all.
//! Lookup walks the list in declaration order and the first match wins, so
//! specific signatures must be registered before general ones.

use crate::errors::StatusCode;
use crate::phase::Phase;
use crate::problem::{Problem, re};
use crate::suggest::{
    report_issue_suggestion, suggest_build_push_access_denied, suggest_cluster_connection,
    suggest_docker_pull, suggest_docker_running, suggest_fix_cache,
};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Message prefix used by image pushers.
pub const PUSH_IMAGE_ERR: &str = "could not push image";

/// Matches errors returned by the Docker client when the daemon is down.
pub const DOCKER_CONNECTION_FAILED: &str = ".*(Cannot connect to the Docker daemon.*) Is";

/// Build cancelled because another build in the same run failed.
pub const BUILD_CANCELLED: &str = ".*context canceled.*";

const CLUSTER_CONNECTION_FAILED: &str = "(Unable to connect to the server[^\n]*)";

const OLD_IMAGE_MANIFEST: &str = concat!(
    r#".*(unsupported MediaType: "application/vnd\.docker\.distribution\.manifest\.v1\+prettyjws""#,
    r"|schema 1 manifest).*",
);

static DOCKER_CONNECTION_RE: LazyLock<Regex> = LazyLock::new(|| re(DOCKER_CONNECTION_FAILED));
static CLUSTER_CONNECTION_RE: LazyLock<Regex> = LazyLock::new(|| re(CLUSTER_CONNECTION_FAILED));

static BUILTIN: LazyLock<ProblemRegistry> = LazyLock::new(|| ProblemRegistry {
    entries: builtin_entries(),
    fallback: Problem::catch_all(StatusCode::UnknownError, report_issue_suggestion),
});

/// Phase order used by [`ProblemRegistry::lookup_any`] before the rest.
const LOOKUP_ANY_ORDER: [Phase; 3] = [Phase::Build, Phase::Deploy, Phase::Init];

/// Errors building a custom registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("problem list for phase {0} does not end in a catch-all entry")]
    MissingCatchAll(Phase),

    #[error("phase {0} is registered more than once")]
    DuplicatePhase(Phase),
}

/// Immutable, ordered mapping from phase to known problems.
#[derive(Debug, Clone)]
pub struct ProblemRegistry {
    entries: Vec<(Phase, Vec<Problem>)>,
    fallback: Problem,
}

impl ProblemRegistry {
    /// Builds a registry, checking that every list ends in a catch-all.
    pub fn new(entries: Vec<(Phase, Vec<Problem>)>) -> Result<Self, RegistryError> {
        let mut seen = Vec::with_capacity(entries.len());
        for (phase, problems) in &entries {
            if seen.contains(phase) {
                return Err(RegistryError::DuplicatePhase(*phase));
            }
            seen.push(*phase);
            if !problems.last().is_some_and(Problem::is_catch_all) {
                return Err(RegistryError::MissingCatchAll(*phase));
            }
        }
        Ok(Self {
            entries,
            fallback: Problem::catch_all(StatusCode::UnknownError, report_issue_suggestion),
        })
    }

    /// The built-in registry shared by the whole process.
    pub fn builtin() -> &'static ProblemRegistry {
        &BUILTIN
    }

    /// Problems registered for `phase`, including its catch-all.
    pub fn problems(&self, phase: Phase) -> &[Problem] {
        self.entries
            .iter()
            .find(|(p, _)| *p == phase)
            .map(|(_, problems)| problems.as_slice())
            .unwrap_or(&[])
    }

    /// Phases with a dedicated list, in registration order.
    pub fn phases(&self) -> impl Iterator<Item = Phase> + '_ {
        self.entries.iter().map(|(phase, _)| *phase)
    }

    /// Entry used for phases without a dedicated list.
    pub fn fallback(&self) -> &Problem {
        &self.fallback
    }

    /// First problem of `phase` matching `message`. Never fails.
    pub fn lookup(&self, phase: Phase, message: &str) -> &Problem {
        self.problems(phase)
            .iter()
            .find(|problem| problem.matches(message))
            .unwrap_or(&self.fallback)
    }

    /// First non-catch-all problem of any phase matching `message`.
    ///
    /// Build, Deploy and Init are scanned first, then the remaining phases in
    /// registration order.
    pub fn lookup_any(&self, message: &str) -> Option<&Problem> {
        let rest = self
            .phases()
            .filter(|phase| !LOOKUP_ANY_ORDER.contains(phase));
        LOOKUP_ANY_ORDER
            .into_iter()
            .chain(rest)
            .flat_map(|phase| self.problems(phase))
            .filter(|problem| !problem.is_catch_all())
            .find(|problem| problem.matches(message))
    }

    /// First registered problem with `code`.
    pub fn find_by_code(&self, code: StatusCode) -> Option<&Problem> {
        self.entries
            .iter()
            .flat_map(|(_, problems)| problems)
            .find(|problem| problem.status_code() == code)
    }
}

fn capture_or_message(regex: &Regex, message: &str) -> String {
    regex
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map_or_else(|| message.to_string(), |m| m.as_str().to_string())
}

fn build_problems() -> Vec<Problem> {
    vec![
        Problem::new(
            re(&format!(".*{PUSH_IMAGE_ERR}.*(denied|unauthorized): .*")),
            StatusCode::BuildPushAccessDenied,
            suggest_build_push_access_denied,
        )
        .with_description(|_| {
            "Build Failed. No push access to specified image repository".to_string()
        }),
        Problem::new(
            DOCKER_CONNECTION_RE.clone(),
            StatusCode::BuildDockerDaemonNotRunning,
            suggest_docker_running,
        )
        .with_description(|message| {
            format!(
                "Build Failed. {}. Check if docker is running",
                capture_or_message(&DOCKER_CONNECTION_RE, message).trim_end_matches('.')
            )
        }),
        Problem::new(
            re(BUILD_CANCELLED),
            StatusCode::BuildCancelled,
            crate::suggest::no_suggestions,
        )
        .with_description(|_| "Build Cancelled".to_string()),
    ]
}

fn deploy_problems() -> Vec<Problem> {
    vec![
        Problem::new(
            CLUSTER_CONNECTION_RE.clone(),
            StatusCode::DeployClusterConnectionErr,
            suggest_cluster_connection,
        )
        .with_description(|message| {
            format!(
                "Deploy Failed. Could not connect to cluster due to \"{}\"",
                capture_or_message(&CLUSTER_CONNECTION_RE, message)
            )
        }),
    ]
}

fn init_problems() -> Vec<Problem> {
    vec![
        Problem::new(
            re("creating tagger: .*"),
            StatusCode::InitCreateTaggerError,
            report_issue_suggestion,
        ),
        Problem::new(
            re("creating builder: .*"),
            StatusCode::InitCreateBuilderError,
            report_issue_suggestion,
        ),
        Problem::new(
            re("creating deployer: .*"),
            StatusCode::InitCreateDeployerError,
            report_issue_suggestion,
        ),
        Problem::new(
            re("expanding test file paths: .*"),
            StatusCode::InitCreateTestDepError,
            report_issue_suggestion,
        ),
        Problem::new(
            re("initializing cache: .*"),
            StatusCode::InitCacheError,
            suggest_fix_cache,
        ),
        Problem::new(
            re("creating watch trigger: .*"),
            StatusCode::InitCreateWatchTriggerError,
            report_issue_suggestion,
        ),
    ]
}

fn dev_init_problems() -> Vec<Problem> {
    vec![
        Problem::new(
            re(OLD_IMAGE_MANIFEST),
            StatusCode::DevInitUnsupportedV1Manifest,
            suggest_docker_pull,
        )
        .with_description(|_| {
            "Could not retrieve image pushed with the deprecated manifest v1. \
             Ignoring files dependencies for this image"
                .to_string()
        }),
    ]
}

fn with_catch_all(mut problems: Vec<Problem>, phase: Phase) -> Vec<Problem> {
    problems.push(Problem::catch_all(
        StatusCode::unknown_for(phase),
        report_issue_suggestion,
    ));
    problems
}

fn builtin_entries() -> Vec<(Phase, Vec<Problem>)> {
    vec![
        (Phase::Build, with_catch_all(build_problems(), Phase::Build)),
        (Phase::Init, with_catch_all(init_problems(), Phase::Init)),
        (Phase::Deploy, with_catch_all(deploy_problems(), Phase::Deploy)),
        (Phase::StatusCheck, with_catch_all(Vec::new(), Phase::StatusCheck)),
        (Phase::FileSync, with_catch_all(Vec::new(), Phase::FileSync)),
        (Phase::DevInit, with_catch_all(dev_init_problems(), Phase::DevInit)),
        (Phase::Cleanup, with_catch_all(Vec::new(), Phase::Cleanup)),
    ]
}
