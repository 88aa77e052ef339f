//! Classification engine.
//!
//! [`Classifier`] maps `(phase, error)` pairs to a status code and ordered
//! suggestions. Errors that already carry a classification are passed
//! through untouched; everything else goes through the phase's problem list.
//!
//! Only the external entry points ([`Classifier::to_actionable_error`] and
//! [`Classifier::show_actionable_error`]) report to telemetry, once per call.

use crate::actionable::{ActionableError, find_classified};
use crate::context::{RunContext, RunContextHolder};
use crate::errors::{StatusCode, Suggestion, concat_suggestions};
use crate::global_config::{FileConfigStore, GlobalConfigStore};
use crate::phase::Phase;
use crate::problem::ProblemError;
use crate::registry::ProblemRegistry;
use crate::suggest::SuggestionContext;
use crate::telemetry::{ErrorCodeRecorder, NoopRecorder};
use std::error::Error as StdError;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of [`Classifier::old_image_manifest_problem`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OldImageManifest {
    /// The error is not a deprecated-manifest failure.
    NotMatched,
    /// Matched, but there is nothing to tell the user.
    Matched,
    /// Matched; the string is the description followed by suggestions.
    MatchedWithHint(String),
}

/// Result of resolving an error against the registry.
struct Resolution {
    status_code: StatusCode,
    suggestions: Vec<Suggestion>,
    message: String,
}

/// Shared, thread-safe classification engine.
pub struct Classifier {
    registry: Arc<ProblemRegistry>,
    context: Arc<RunContextHolder>,
    store: Arc<dyn GlobalConfigStore>,
    recorder: Arc<dyn ErrorCodeRecorder>,
}

impl Classifier {
    /// Engine over the built-in registry, reading persisted config from the
    /// default location and discarding telemetry.
    pub fn new(context: Arc<RunContextHolder>) -> Self {
        Self {
            registry: Arc::new(ProblemRegistry::builtin().clone()),
            context,
            store: Arc::new(FileConfigStore::new()),
            recorder: Arc::new(NoopRecorder),
        }
    }

    #[must_use]
    pub fn with_registry(mut self, registry: Arc<ProblemRegistry>) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub fn with_config_store(mut self, store: Arc<dyn GlobalConfigStore>) -> Self {
        self.store = store;
        self
    }

    #[must_use]
    pub fn with_recorder(mut self, recorder: Arc<dyn ErrorCodeRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    pub fn registry(&self) -> &ProblemRegistry {
        &self.registry
    }

    pub fn context(&self) -> &RunContextHolder {
        &self.context
    }

    /// Publishes the run context. Only the first call takes effect.
    pub fn set_run_context(&self, ctx: RunContext) -> bool {
        self.context.set(ctx)
    }

    fn suggestion_context(&self) -> SuggestionContext<'_> {
        SuggestionContext::new(self.context.get(), self.store.as_ref())
    }

    /// Status code and suggestions for `err` raised during `phase`.
    ///
    /// Pre-classified errors keep their classification verbatim. Never
    /// reports to telemetry.
    pub fn classify(
        &self,
        phase: Phase,
        err: &(dyn StdError + 'static),
    ) -> (StatusCode, Vec<Suggestion>) {
        let resolution = self.resolve(phase, err);
        (resolution.status_code, resolution.suggestions)
    }

    fn resolve(&self, phase: Phase, err: &(dyn StdError + 'static)) -> Resolution {
        if let Some(classified) = find_classified(err) {
            debug!(
                %phase,
                code = %classified.status_code().code_string(),
                "reusing existing classification"
            );
            // The classified Display already ends with its suggestions.
            return Resolution {
                status_code: classified.status_code(),
                suggestions: classified.suggestions(),
                message: classified.message().to_string(),
            };
        }

        let message = error_text(err);
        let problem = self.registry.lookup(phase, &message);
        debug!(
            %phase,
            code = %problem.status_code().code_string(),
            pattern = problem.pattern(),
            "classified error"
        );
        Resolution {
            status_code: problem.status_code(),
            suggestions: problem.suggest(&self.suggestion_context()),
            message: problem.describe(&message),
        }
    }

    /// Classifies `err` and reports its status code to telemetry once.
    pub fn to_actionable_error(
        &self,
        phase: Phase,
        err: &(dyn StdError + 'static),
    ) -> ActionableError {
        let resolution = self.resolve(phase, err);
        self.record(resolution.status_code);
        ActionableError::new(
            resolution.status_code,
            resolution.message,
            resolution.suggestions,
        )
    }

    /// Best-effort classification without a phase.
    ///
    /// Returns `None`, without reporting, when `err` is neither
    /// pre-classified nor matched by any phase's known problems.
    pub fn show_actionable_error(&self, err: &(dyn StdError + 'static)) -> Option<ProblemError> {
        if let Some(classified) = find_classified(err) {
            let code = classified.status_code();
            self.record(code);
            return Some(ProblemError::from_parts(
                code,
                classified.message(),
                classified.suggestions(),
            ));
        }

        let message = error_text(err);
        let problem = self.registry.lookup_any(&message)?;
        self.record(problem.status_code());
        Some(problem.with_err(&message, &self.suggestion_context()))
    }

    /// Detects images pushed with the deprecated v1 manifest.
    pub fn old_image_manifest_problem(&self, err: &(dyn StdError + 'static)) -> OldImageManifest {
        let Some(problem) = self
            .registry
            .find_by_code(StatusCode::DevInitUnsupportedV1Manifest)
        else {
            return OldImageManifest::NotMatched;
        };

        let message = error_text(err);
        if !problem.matches(&message) {
            return OldImageManifest::NotMatched;
        }

        let suggestions = problem.suggest(&self.suggestion_context());
        if suggestions.is_empty() {
            return OldImageManifest::Matched;
        }
        OldImageManifest::MatchedWithHint(format!(
            "{}. {}",
            problem.describe(&message),
            concat_suggestions(&suggestions)
        ))
    }

    fn record(&self, code: StatusCode) {
        if let Err(err) = self.recorder.record_error_code(code) {
            warn!(code = %code.code_string(), error = %err, "failed to record error code");
        }
    }
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("registry", &self.registry)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Full text of `err` including its sources, `outer: inner` style.
///
/// Sources whose text already appears in the accumulated message are
/// skipped, so errors that embed their cause aren't repeated.
pub fn error_text(err: &(dyn StdError + 'static)) -> String {
    let mut text = err.to_string();
    let mut current = err.source();
    while let Some(source) = current {
        let part = source.to_string();
        if !text.contains(&part) {
            text.push_str(": ");
            text.push_str(&part);
        }
        current = source.source();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actionable::Classified;
    use crate::errors::SuggestionCode;
    use crate::global_config::{ContextConfig, GlobalConfigError};
    use crate::problem::{Problem, re};
    use crate::suggest::no_suggestions;
    use crate::telemetry::TelemetryError;
    use std::path::Path;
    use std::sync::Mutex;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("{0}")]
    struct RawError(String);

    #[derive(Debug, Error)]
    #[error("running pipeline")]
    struct Outer {
        #[source]
        source: ActionableError,
    }

    #[derive(Default)]
    struct RecordingSink {
        codes: Mutex<Vec<StatusCode>>,
    }

    impl ErrorCodeRecorder for RecordingSink {
        fn record_error_code(&self, code: StatusCode) -> Result<(), TelemetryError> {
            self.codes.lock().expect("lock").push(code);
            Ok(())
        }
    }

    struct BrokenSink;

    impl ErrorCodeRecorder for BrokenSink {
        fn record_error_code(&self, _code: StatusCode) -> Result<(), TelemetryError> {
            Err(TelemetryError::Unavailable("collector offline".into()))
        }
    }

    struct EmptyStore;

    impl GlobalConfigStore for EmptyStore {
        fn config_for_context(
            &self,
            _global_config: Option<&Path>,
            _kube_context: Option<&str>,
        ) -> Result<ContextConfig, GlobalConfigError> {
            Ok(ContextConfig::default())
        }
    }

    fn raw(message: &str) -> RawError {
        RawError(message.to_string())
    }

    fn push_denied() -> RawError {
        raw("could not push image app: denied: requested access to the resource is denied")
    }

    fn classifier_with(ctx: Option<RunContext>) -> (Classifier, Arc<RecordingSink>) {
        let holder = Arc::new(match ctx {
            Some(ctx) => RunContextHolder::with_context(ctx),
            None => RunContextHolder::new(),
        });
        let sink = Arc::new(RecordingSink::default());
        let classifier = Classifier::new(holder)
            .with_config_store(Arc::new(EmptyStore))
            .with_recorder(sink.clone());
        (classifier, sink)
    }

    #[test]
    fn test_classify_push_denied_with_override() {
        let ctx = RunContext::new().with_default_repo("myrepo.gcr.io");
        let (classifier, _) = classifier_with(Some(ctx));
        let err = raw("could not push image myrepo.gcr.io/app: denied: permission denied");

        let (code, suggestions) = classifier.classify(Phase::Build, &err);
        assert_eq!(code, StatusCode::BuildPushAccessDenied);
        assert_eq!(suggestions[0].code, SuggestionCode::CheckDefaultRepo);
        assert_eq!(suggestions[1].code, SuggestionCode::GcloudDockerAuthConfigure);
    }

    #[test]
    fn test_classify_without_context_falls_back_to_generic() {
        let (classifier, _) = classifier_with(None);
        let err = raw("could not push image app: unauthorized: authentication required");

        let (code, suggestions) = classifier.classify(Phase::Build, &err);
        assert_eq!(code, StatusCode::BuildPushAccessDenied);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].code, SuggestionCode::AddDefaultRepo);
    }

    #[test]
    fn test_classify_reuses_existing_classification() {
        let (classifier, sink) = classifier_with(None);
        let original = ActionableError::new(
            StatusCode::DeployClusterConnectionErr,
            "Unable to connect to the server",
            vec![Suggestion::new(SuggestionCode::CheckClusterConnection, "check it")],
        );

        // Build would otherwise classify this as BUILD_UNKNOWN.
        let (code, suggestions) = classifier.classify(Phase::Build, &original);
        assert_eq!(code, StatusCode::DeployClusterConnectionErr);
        assert_eq!(suggestions, original.suggestion_list());

        let wrapped = Outer { source: original.clone() };
        let (code, suggestions) = classifier.classify(Phase::Cleanup, &wrapped);
        assert_eq!(code, StatusCode::DeployClusterConnectionErr);
        assert_eq!(suggestions, original.suggestion_list());

        assert!(sink.codes.lock().expect("lock").is_empty(), "classify never records");
    }

    #[test]
    fn test_to_actionable_error_records_once() {
        let (classifier, sink) = classifier_with(None);
        let err = raw(
            "Cannot connect to the Docker daemon at unix:///var/run/docker.sock. \
             Is the docker daemon running?",
        );

        let actionable = classifier.to_actionable_error(Phase::Build, &err);
        assert_eq!(actionable.status_code(), StatusCode::BuildDockerDaemonNotRunning);
        assert!(
            actionable
                .message()
                .starts_with("Build Failed. Cannot connect to the Docker daemon")
        );
        assert_eq!(
            *sink.codes.lock().expect("lock"),
            vec![StatusCode::BuildDockerDaemonNotRunning]
        );

        // Feeding the result back in short-circuits and still records once.
        let again = classifier.to_actionable_error(Phase::Deploy, &actionable);
        assert_eq!(again.status_code(), StatusCode::BuildDockerDaemonNotRunning);
        assert_eq!(again.suggestion_list(), actionable.suggestion_list());
        assert_eq!(sink.codes.lock().expect("lock").len(), 2);
    }

    #[test]
    fn test_reclassified_error_renders_identically() {
        let (classifier, _) = classifier_with(None);
        let first = classifier.to_actionable_error(Phase::Build, &push_denied());
        assert!(!first.suggestion_list().is_empty());

        let direct = classifier.to_actionable_error(Phase::Deploy, &first);
        assert_eq!(direct.to_string(), first.to_string());
        assert_eq!(direct.message(), first.message());

        let wrapped = Outer { source: first.clone() };
        let through_wrapper = classifier.to_actionable_error(Phase::Cleanup, &wrapped);
        assert_eq!(through_wrapper.to_string(), first.to_string());

        let rendered = direct.to_string();
        let action = &first.suggestion_list()[0].action;
        assert_eq!(rendered.matches(action.as_str()).count(), 1, "{rendered}");
    }

    #[test]
    fn test_show_actionable_error_renders_classified_identically() {
        let (classifier, _) = classifier_with(None);
        let first = classifier.to_actionable_error(Phase::Build, &push_denied());
        assert!(first.to_string().contains("--default-repo"));

        let shown = classifier.show_actionable_error(&first).expect("classified");
        assert_eq!(shown.to_string(), first.to_string());

        let again = classifier.show_actionable_error(&shown).expect("classified");
        assert_eq!(again.to_string(), first.to_string());
    }

    #[test]
    fn test_to_actionable_error_keeps_raw_message_for_unknown() {
        let (classifier, _) = classifier_with(None);
        let actionable =
            classifier.to_actionable_error(Phase::StatusCheck, &raw("pod crashlooping"));
        assert_eq!(actionable.status_code(), StatusCode::StatusCheckUnknown);
        assert_eq!(actionable.message(), "pod crashlooping");
        assert_eq!(actionable.suggestion_list()[0].code, SuggestionCode::OpenIssue);
    }

    #[test]
    fn test_telemetry_failure_is_swallowed() {
        let classifier = Classifier::new(Arc::new(RunContextHolder::new()))
            .with_config_store(Arc::new(EmptyStore))
            .with_recorder(Arc::new(BrokenSink));
        let actionable = classifier.to_actionable_error(Phase::Build, &raw("context canceled"));
        assert_eq!(actionable.status_code(), StatusCode::BuildCancelled);
    }

    #[test]
    fn test_custom_registry_unregistered_phase() {
        let registry = ProblemRegistry::new(vec![(
            Phase::Build,
            vec![
                Problem::new(re("oom"), StatusCode::BuildCancelled, no_suggestions),
                Problem::catch_all(StatusCode::BuildUnknown, no_suggestions),
            ],
        )])
        .expect("valid registry");
        let (classifier, _) = classifier_with(None);
        let classifier = classifier.with_registry(Arc::new(registry));

        let (code, suggestions) = classifier.classify(Phase::FileSync, &raw("oom"));
        assert_eq!(code, StatusCode::UnknownError);
        assert_eq!(suggestions[0].code, SuggestionCode::OpenIssue);
    }

    #[test]
    fn test_show_actionable_error_matches_known_problem() {
        let ctx = RunContext::new().with_kube_context("minikube");
        let (classifier, sink) = classifier_with(Some(ctx));
        let err = raw("Unable to connect to the server: dial tcp 192.168.49.2:8443: i/o timeout");

        let problem = classifier.show_actionable_error(&err).expect("should match");
        assert_eq!(problem.status_code(), StatusCode::DeployClusterConnectionErr);
        assert_eq!(problem.suggestions()[0].code, SuggestionCode::CheckMinikubeStatus);
        assert!(problem.to_string().contains("minikube status"));
        assert_eq!(
            *sink.codes.lock().expect("lock"),
            vec![StatusCode::DeployClusterConnectionErr]
        );
    }

    #[test]
    fn test_show_actionable_error_unmatched_does_not_record() {
        let (classifier, sink) = classifier_with(None);
        assert!(classifier.show_actionable_error(&raw("segfault")).is_none());
        assert!(sink.codes.lock().expect("lock").is_empty());
    }

    #[test]
    fn test_show_actionable_error_passes_through_classified() {
        let (classifier, sink) = classifier_with(None);
        let original = ActionableError::new(StatusCode::InitCacheError, "bad cache", Vec::new());

        let problem = classifier.show_actionable_error(&original).expect("classified");
        assert_eq!(problem.status_code(), StatusCode::InitCacheError);
        assert_eq!(sink.codes.lock().expect("lock").len(), 1);
    }

    #[test]
    fn test_old_image_manifest_problem() {
        let (classifier, _) = classifier_with(None);
        assert_eq!(
            classifier.old_image_manifest_problem(&raw("manifest unknown")),
            OldImageManifest::NotMatched
        );

        let err = raw(concat!(
            "retrieving image: unsupported MediaType: ",
            r#""application/vnd.docker.distribution.manifest.v1+prettyjws""#,
        ));
        match classifier.old_image_manifest_problem(&err) {
            OldImageManifest::MatchedWithHint(hint) => {
                let expected = "Could not retrieve image pushed with the deprecated manifest v1";
                assert!(hint.starts_with(expected), "{hint}");
                assert!(hint.ends_with("`docker pull` to fetch the specified image and retry."));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_error_text_includes_sources_once() {
        #[derive(Debug, Error)]
        #[error("building app: {0}")]
        struct Embeds(#[source] RawError);

        #[derive(Debug, Error)]
        #[error("building app")]
        struct Hides(#[source] RawError);

        let embeds = Embeds(raw("context canceled"));
        let hides = Hides(raw("context canceled"));
        assert_eq!(error_text(&embeds), "building app: context canceled");
        assert_eq!(error_text(&hides), "building app: context canceled");
    }
}
