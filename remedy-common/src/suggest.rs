//! Suggestion generators.
//!
//! Each generator maps the current run context to zero or more
//! [`Suggestion`]s in priority order. Generators never fail: a persisted
//! config that can't be read is treated as absent.

use crate::context::RunContext;
use crate::errors::{Suggestion, SuggestionCode};
use crate::global_config::GlobalConfigStore;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Signature shared by all suggestion generators.
pub type SuggestFn = fn(&SuggestionContext<'_>) -> Vec<Suggestion>;

pub(crate) const REPORT_ISSUE_TEXT: &str = "If above error is unexpected, please open an issue \
     https://github.com/remedy-dev/remedy/issues/new to report this error";

/// Optional subdomain followed by the managed registry root. Case-sensitive.
static MANAGED_REGISTRY: LazyLock<Regex> =
    LazyLock::new(|| crate::problem::re(r"(.+\.)?gcr\.io.*"));

static EMPTY_CONTEXT: RunContext = RunContext {
    default_repo: None,
    global_config: None,
    kube_context: None,
};

/// Inputs available to a generator.
#[derive(Clone, Copy)]
pub struct SuggestionContext<'a> {
    run: &'a RunContext,
    store: &'a dyn GlobalConfigStore,
}

impl<'a> SuggestionContext<'a> {
    /// A missing run context behaves like an empty one.
    pub fn new(run: Option<&'a RunContext>, store: &'a dyn GlobalConfigStore) -> Self {
        Self {
            run: run.unwrap_or(&EMPTY_CONTEXT),
            store,
        }
    }

    pub fn run(&self) -> &RunContext {
        self.run
    }

    /// Default repository from the persisted config for the active context.
    ///
    /// Read or parse failures are logged and treated as "not configured".
    fn persisted_default_repo(&self) -> Option<String> {
        match self
            .store
            .config_for_context(self.run.global_config(), self.run.kube_context())
        {
            Ok(cfg) => cfg.default_repo().map(str::to_string),
            Err(err) => {
                debug!(error = %err, "ignoring unreadable persisted config");
                None
            }
        }
    }
}

/// The catch-all suggestion attached to every phase's fallback entry.
pub fn report_issue_suggestion(_ctx: &SuggestionContext<'_>) -> Vec<Suggestion> {
    vec![Suggestion::new(SuggestionCode::OpenIssue, REPORT_ISSUE_TEXT)]
}

pub fn no_suggestions(_ctx: &SuggestionContext<'_>) -> Vec<Suggestion> {
    Vec::new()
}

/// Remedies for a push rejected by the registry.
///
/// Prefers the explicit override, then the persisted default repo; either
/// way a registry-specific login hint follows. With neither configured the
/// only advice is to pass a repository explicitly.
pub fn suggest_build_push_access_denied(ctx: &SuggestionContext<'_>) -> Vec<Suggestion> {
    if let Some(repo) = ctx.run().default_repo() {
        return vec![
            Suggestion::new(
                SuggestionCode::CheckDefaultRepo,
                "Check your `--default-repo` value",
            ),
            auth_suggestion_for_repo(repo),
        ];
    }

    if let Some(repo) = ctx.persisted_default_repo() {
        return vec![
            Suggestion::new(
                SuggestionCode::CheckDefaultRepoGlobalConfig,
                "Check your default-repo setting in remedy config",
            ),
            auth_suggestion_for_repo(&repo),
        ];
    }

    vec![Suggestion::new(
        SuggestionCode::AddDefaultRepo,
        "Try running with `--default-repo` flag",
    )]
}

/// Login hint for the registry hosting `repo`.
pub fn auth_suggestion_for_repo(repo: &str) -> Suggestion {
    if MANAGED_REGISTRY.is_match(repo) {
        Suggestion::new(
            SuggestionCode::GcloudDockerAuthConfigure,
            "try `gcloud auth configure-docker`",
        )
    } else {
        Suggestion::new(SuggestionCode::DockerAuthConfigure, "try `docker login`")
    }
}

pub fn suggest_docker_running(_ctx: &SuggestionContext<'_>) -> Vec<Suggestion> {
    vec![Suggestion::new(
        SuggestionCode::CheckDockerRunning,
        "Check if docker is running",
    )]
}

/// Points minikube users at `minikube status`, everyone else at their
/// cluster connection.
pub fn suggest_cluster_connection(ctx: &SuggestionContext<'_>) -> Vec<Suggestion> {
    if ctx.run().kube_context() == Some("minikube") {
        return vec![Suggestion::new(
            SuggestionCode::CheckMinikubeStatus,
            "Check if minikube is running using `minikube status` command and try again",
        )];
    }
    vec![Suggestion::new(
        SuggestionCode::CheckClusterConnection,
        "Check your connection for the cluster",
    )]
}

pub fn suggest_fix_cache(_ctx: &SuggestionContext<'_>) -> Vec<Suggestion> {
    vec![Suggestion::new(
        SuggestionCode::FixCacheError,
        "Fix the artifact cache file or run with `--cache-artifacts=false`",
    )]
}

pub fn suggest_docker_pull(_ctx: &SuggestionContext<'_>) -> Vec<Suggestion> {
    vec![Suggestion::new(
        SuggestionCode::RunDockerPull,
        "To avoid, hit Cntrl-C and run `docker pull` to fetch the specified image and retry",
    )]
}
